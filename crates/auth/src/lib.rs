//! `panelerp-auth`: role and permission authorization model.
//!
//! Pure domain logic: module normalization, the permission matrix, technical
//! functions, the role editor and capability queries. No HTTP, no storage.

pub mod capability;
pub mod editor;
pub mod matrix;
pub mod normalize;
pub mod permissions;
pub mod roles;
pub mod surfacing;
pub mod technical;

pub use capability::{AuthorizationService, AuthzError, Capabilities, CapabilityExplanation, CapabilityGrants};
pub use editor::{EditTarget, EditorError, EditorState, ProjectedIds, RoleEditor, project};
pub use matrix::{ActionRow, MatrixBuild, PermissionMatrix};
pub use normalize::{ModuleKey, TECHNICAL_MODULE, normalize};
pub use permissions::{ADMIN, DELETE, EDIT, Permission, VIEW, action_label};
pub use roles::{Role, RoleDraft, RoleSubmission};
pub use surfacing::RetiredModules;
pub use technical::{PRIORITY_FUNCTION, TechnicalFunction};
