//! Correlation-id storage scoped to one logical task.
//!
//! The middleware opens a [`scope`] around each request and binds the id
//! there; everything logged on that task reads the same value. Sibling
//! tasks never observe each other's binding.

use std::cell::RefCell;
use std::future::Future;
use uuid::Uuid;

tokio::task_local! {
    static CORRELATION_ID: RefCell<Option<String>>;
}

/// Generate a fresh correlation id (UUID v4).
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Run `fut` inside a fresh, empty correlation scope. The binding made by
/// [`set_correlation_id`] lives exactly as long as `fut`.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID.scope(RefCell::new(None), fut).await
}

/// Current correlation id for the calling task. Never empty.
///
/// Inside a [`scope`] an unset read mints an id and binds it, so repeated
/// reads agree. Outside any scope there is nothing to bind to and each read
/// mints a fresh id.
pub fn get_correlation_id() -> String {
    CORRELATION_ID
        .try_with(|slot| {
            let mut slot = slot.borrow_mut();
            match &*slot {
                Some(id) => id.clone(),
                None => {
                    let id = new_correlation_id();
                    *slot = Some(id.clone());
                    id
                }
            }
        })
        .unwrap_or_else(|_| new_correlation_id())
}

/// Bind a correlation id to the calling task's scope and return it.
/// An absent or empty `value` binds a freshly generated id. Outside any
/// scope the id is still returned but nothing persists.
pub fn set_correlation_id(value: Option<&str>) -> String {
    let id = match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => new_correlation_id(),
    };
    let _ = CORRELATION_ID.try_with(|slot| {
        *slot.borrow_mut() = Some(id.clone());
    });
    id
}
