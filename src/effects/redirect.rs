//! Turns a [`Redirect`] into a concrete path.

use crate::model::{RecordId, Redirect};

/// Resolves where to navigate after a mutation.
///
/// | redirect | result |
/// |----------|--------|
/// | `List` | `base_path` |
/// | `Create` | `base_path/create` |
/// | `Edit` | `base_path/id` |
/// | `Show` | `base_path/id/show` |
/// | `Path(p)` | `p` |
/// | `None` | no navigation |
///
/// `Edit` and `Show` need an id; without one there is nowhere to go.
pub fn resolve_redirect_to(
    redirect: &Redirect,
    base_path: &str,
    id: Option<&RecordId>,
) -> Option<String> {
    match redirect {
        Redirect::List => Some(base_path.to_string()),
        Redirect::Create => Some(format!("{base_path}/create")),
        Redirect::Edit => id.map(|id| format!("{base_path}/{id}")),
        Redirect::Show => id.map(|id| format!("{base_path}/{id}/show")),
        Redirect::Path(path) => Some(path.clone()),
        Redirect::None => None,
    }
}
