//! User-facing failure dialogs.
//!
//! Every asynchronous failure in the client ends here: the pipeline and the
//! commit coordinator catch their errors and show one of these fixed alerts.
//! No error codes travel past that boundary.

/// Displays a blocking modal. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn show(&self, title: &str, message: &str);
}

/// A fixed title + message pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: &'static str,
}

impl Alert {
    pub fn show_on(&self, notifier: &dyn Notifier) {
        notifier.show(self.title, self.message);
    }
}

/// Submission blocked by validation.
pub const INVALID_FIELDS: Alert = Alert {
    title: "Campos inválidos",
    message: "O formulário de serviço contem informações inválidas.",
};

/// Delete failed in the store.
pub const DELETE_FAILURE: Alert = Alert {
    title: "Erro de conexão",
    message: "Ocorreu uma falha durante a tentativa de apagar o serviço.",
};

/// The record behind the edit screen could not be loaded.
pub const EDIT_LOAD_FAILURE: Alert = Alert {
    title: "Erro de conexão",
    message: "Ocorreu uma falha durante a tentativa de editar o serviço.",
};

/// Merge-write failed after the user already left the screen.
pub const SAVE_FAILURE: Alert = Alert {
    title: "Erro de conexão",
    message: "Ocorreu uma falha durante a tentativa de salvar o serviço.",
};
