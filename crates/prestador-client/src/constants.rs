//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Where [`AuthRouter`](crate::AuthRouter) sends a signed-out user.
pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";

/// Where [`AuthRouter`](crate::AuthRouter) sends a signed-in user.
pub const DEFAULT_HOME_PATH: &str = "/home";

/// Maximum characters in a service name.
pub const NAME_MAX_LEN: usize = 60;

/// Maximum characters in a service description.
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Masked phone pattern accepted by the form.
pub const PHONE_PATTERN: &str = r"^\(\d{2}\) \d{5}-\d{4}$";

/// Edit screen header when creating a record.
pub const CREATE_TITLE: &str = "Novo serviço";
pub const CREATE_SUBTITLE: &str = "Cadastre um serviço que você oferece";

/// Edit screen header when editing an existing record.
pub const EDIT_TITLE: &str = "Editar serviço";
pub const EDIT_SUBTITLE: &str = "Altere as informações do seu serviço";
