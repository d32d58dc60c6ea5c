//! Point queries against a loaded tree.

use crate::error::{DepError, Result};
use crate::tag::TypeTag;
use crate::tree::{DepTree, ServiceName};

/// Return a copy of `service`'s edge set of kind `type_tag`.
///
/// Mirrors `rc_deptree_depend`: "not found" covers both an unknown service
/// and a known service with no edges of that kind.
pub fn depend(tree: &DepTree, service: &str, type_tag: TypeTag) -> Result<Vec<ServiceName>> {
    let di = tree.get(service).ok_or_else(|| DepError::ServiceNotFound { service: service.to_string() })?;
    let dt = di.get(type_tag).ok_or_else(|| DepError::TypeNotFound {
        service: service.to_string(),
        type_tag,
    })?;
    Ok(dt.services().to_vec())
}
