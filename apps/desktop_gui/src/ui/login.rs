//! Login / registration screen.

use eframe::egui::{self, Key, Margin, Rounding, Stroke};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::app::VisorApp;
use crate::ui::theme::{self, colors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Registro,
}

pub struct LoginState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub nombre_completo: String,
    pub busy: bool,
    /// Registration confirmation shown above the login form.
    pub notice: Option<String>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            password: String::new(),
            confirm: String::new(),
            nombre_completo: String::new(),
            busy: false,
            notice: None,
        }
    }
}

pub struct PasswordChecks {
    pub min_len: bool,
    pub upper: bool,
    pub lower: bool,
    pub digit: bool,
    pub special: bool,
}

impl PasswordChecks {
    pub fn all(&self) -> bool {
        self.min_len && self.upper && self.lower && self.digit && self.special
    }
}

/// Client-side password strength gate for registration. All checks must pass
/// before the request is sent.
pub fn password_checks(password: &str) -> PasswordChecks {
    const SPECIAL: &str = "!@#$%^&*(),.?\":{}|<>";
    PasswordChecks {
        min_len: password.chars().count() >= 8,
        upper: password.chars().any(|c| c.is_ascii_uppercase()),
        lower: password.chars().any(|c| c.is_ascii_lowercase()),
        digit: password.chars().any(|c| c.is_ascii_digit()),
        special: password.chars().any(|c| SPECIAL.contains(c)),
    }
}

fn can_submit_login(state: &LoginState) -> bool {
    state.email.trim().contains('@') && !state.password.is_empty()
}

fn can_submit_register(state: &LoginState) -> bool {
    !state.nombre_completo.trim().is_empty()
        && state.email.trim().contains('@')
        && password_checks(&state.password).all()
        && state.confirm == state.password
}

impl VisorApp {
    pub(crate) fn render_login(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(380.0, 460.0);
            ui.add_space((avail.y * 0.12).clamp(24.0, 110.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                egui::Frame::none()
                    .fill(colors::BG_DARK)
                    .rounding(Rounding::same(10.0))
                    .stroke(Stroke::new(1.0, colors::BORDER))
                    .inner_margin(Margin::same(20.0))
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.heading("Visor DICOM");
                            ui.weak("Procesamiento de imágenes médicas");
                        });
                        ui.add_space(10.0);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(self.login.mode == AuthMode::Login, "Iniciar sesión")
                                .clicked()
                            {
                                self.login.mode = AuthMode::Login;
                            }
                            if ui
                                .selectable_label(self.login.mode == AuthMode::Registro, "Registrarse")
                                .clicked()
                            {
                                self.login.mode = AuthMode::Registro;
                            }
                        });
                        ui.separator();

                        if let Some(notice) = self.login.notice.clone() {
                            ui.colored_label(colors::SUCCESS, notice);
                            ui.add_space(6.0);
                        }

                        match self.login.mode {
                            AuthMode::Login => self.login_form(ui),
                            AuthMode::Registro => self.register_form(ui),
                        }
                    });
            });
        });
    }

    fn login_form(&mut self, ui: &mut egui::Ui) {
        let email_resp = ui.add(
            egui::TextEdit::singleline(&mut self.login.email)
                .hint_text("Correo electrónico")
                .desired_width(f32::INFINITY),
        );
        let pass_resp = ui.add(
            egui::TextEdit::singleline(&mut self.login.password)
                .hint_text("Contraseña")
                .password(true)
                .desired_width(f32::INFINITY),
        );

        let enter = ui.input(|i| i.key_pressed(Key::Enter));
        if enter && (email_resp.lost_focus() || pass_resp.lost_focus()) {
            self.submit_login();
        }

        ui.add_space(8.0);
        let enabled = !self.login.busy && can_submit_login(&self.login);
        let button = theme::primary_button("Iniciar sesión").min_size(egui::vec2(ui.available_width(), 36.0));
        if ui.add_enabled(enabled, button).clicked() {
            self.submit_login();
        }
        if self.login.busy {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.weak("Verificando credenciales...");
            });
        }
    }

    fn register_form(&mut self, ui: &mut egui::Ui) {
        ui.add(
            egui::TextEdit::singleline(&mut self.login.nombre_completo)
                .hint_text("Nombre completo")
                .desired_width(f32::INFINITY),
        );
        ui.add(
            egui::TextEdit::singleline(&mut self.login.email)
                .hint_text("Correo electrónico")
                .desired_width(f32::INFINITY),
        );
        ui.add(
            egui::TextEdit::singleline(&mut self.login.password)
                .hint_text("Contraseña")
                .password(true)
                .desired_width(f32::INFINITY),
        );
        ui.add(
            egui::TextEdit::singleline(&mut self.login.confirm)
                .hint_text("Confirmar contraseña")
                .password(true)
                .desired_width(f32::INFINITY),
        );

        let checks = password_checks(&self.login.password);
        ui.add_space(4.0);
        check_row(ui, checks.min_len, "Mínimo 8 caracteres");
        check_row(ui, checks.upper, "Una letra mayúscula");
        check_row(ui, checks.lower, "Una letra minúscula");
        check_row(ui, checks.digit, "Un número");
        check_row(ui, checks.special, "Un carácter especial");
        if !self.login.confirm.is_empty() && self.login.confirm != self.login.password {
            ui.colored_label(colors::DANGER, "Las contraseñas no coinciden");
        }

        ui.add_space(8.0);
        let enabled = !self.login.busy && can_submit_register(&self.login);
        let button = theme::primary_button("Crear cuenta").min_size(egui::vec2(ui.available_width(), 36.0));
        if ui.add_enabled(enabled, button).clicked() {
            self.submit_register();
        }
        if self.login.busy {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.weak("Creando cuenta...");
            });
        }
    }

    fn submit_login(&mut self) {
        if self.login.busy || !can_submit_login(&self.login) {
            return;
        }
        self.login.busy = true;
        self.login.notice = None;
        self.banner = None;
        let cmd = BackendCommand::Login {
            email: self.login.email.trim().to_string(),
            password: self.login.password.clone(),
        };
        self.dispatch(cmd);
    }

    fn submit_register(&mut self) {
        if self.login.busy || !can_submit_register(&self.login) {
            return;
        }
        self.login.busy = true;
        self.login.notice = None;
        self.banner = None;
        let cmd = BackendCommand::Register {
            nombre_completo: self.login.nombre_completo.trim().to_string(),
            email: self.login.email.trim().to_string(),
            password: self.login.password.clone(),
        };
        self.dispatch(cmd);
    }
}

fn check_row(ui: &mut egui::Ui, ok: bool, text: &str) {
    let (mark, color) = if ok {
        ("✔", colors::SUCCESS)
    } else {
        ("•", colors::TEXT_MUTED)
    };
    ui.horizontal(|ui| {
        ui.colored_label(color, mark);
        ui.colored_label(color, text);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_checks_require_every_class() {
        assert!(password_checks("Abcdef1!").all());
        assert!(!password_checks("abcdef1!").all()); // no uppercase
        assert!(!password_checks("ABCDEF1!").all()); // no lowercase
        assert!(!password_checks("Abcdefg!").all()); // no digit
        assert!(!password_checks("Abcdefg1").all()); // no special
        assert!(!password_checks("Ab1!").all()); // too short
    }

    #[test]
    fn register_gating_needs_matching_confirmation() {
        let mut state = LoginState {
            nombre_completo: "Ana Pérez".into(),
            email: "ana@example.com".into(),
            password: "Abcdef1!".into(),
            confirm: "Abcdef1!".into(),
            ..LoginState::default()
        };
        assert!(can_submit_register(&state));
        state.confirm = "otra".into();
        assert!(!can_submit_register(&state));
        state.confirm = state.password.clone();
        state.email = "sin-arroba".into();
        assert!(!can_submit_register(&state));
    }
}
