use std::io;

use async_trait::async_trait;

use crate::{
    infra::{config::is_valid_phone, secrets::sanitize_error_code},
    usecases::terminal::Terminal,
};

/// Fresh codes requested after the platform reports expiry, per run.
const MAX_CODE_REFRESHES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub phone_attempts: usize,
    pub code_attempts: usize,
    pub password_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            phone_attempts: 3,
            code_attempts: 3,
            password_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCodeToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Authorized,
    PasswordRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBackendError {
    InvalidPhone,
    InvalidCode,
    CodeExpired,
    WrongPassword,
    InvalidApiCredentials,
    Timeout,
    FloodWait { seconds: u32 },
    Transient { code: &'static str, message: String },
}

#[async_trait]
pub trait TelegramAuthClient: Send {
    async fn request_login_code(&mut self, phone: &str)
        -> Result<AuthCodeToken, AuthBackendError>;
    async fn sign_in_with_code(
        &mut self,
        token: &AuthCodeToken,
        code: &str,
    ) -> Result<SignInOutcome, AuthBackendError>;
    async fn verify_password(&mut self, password: &str) -> Result<(), AuthBackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidedAuthOutcome {
    Authenticated,
    ExitWithGuidance,
}

pub async fn run_guided_auth(
    terminal: &mut dyn Terminal,
    auth_client: &mut dyn TelegramAuthClient,
    configured_phone: Option<&str>,
    retry_policy: &RetryPolicy,
) -> io::Result<GuidedAuthOutcome> {
    terminal.print_line("No authorized session found. Starting guided authentication.")?;

    let phone = match configured_phone.filter(|phone| is_valid_phone(phone)) {
        Some(phone) => {
            terminal.print_line("Step 1/3: using the phone number from the config file.")?;
            phone.to_owned()
        }
        None => match collect_phone(terminal, retry_policy.phone_attempts)? {
            Some(phone) => phone,
            None => return Ok(GuidedAuthOutcome::ExitWithGuidance),
        },
    };

    let Some(token) =
        request_code(terminal, auth_client, &phone, retry_policy.phone_attempts).await?
    else {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    };

    let Some(outcome) = collect_code(terminal, auth_client, &phone, token, retry_policy).await?
    else {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    };

    if matches!(outcome, SignInOutcome::PasswordRequired)
        && collect_password(terminal, auth_client, retry_policy.password_attempts)
            .await?
            .is_none()
    {
        return Ok(GuidedAuthOutcome::ExitWithGuidance);
    }

    tracing::info!("guided authentication completed");
    terminal.print_line("Authentication successful. Session saved.")?;

    Ok(GuidedAuthOutcome::Authenticated)
}

fn collect_phone(terminal: &mut dyn Terminal, attempts: usize) -> io::Result<Option<String>> {
    for attempt in 1..=attempts {
        terminal.print_line(
            "Step 1/3: enter your phone number in international format, e.g. +15551234567.",
        )?;
        let Some(phone) = terminal.prompt_line("Phone: ")? else {
            terminal.print_line("Input cancelled (EOF). Run tgfold again to retry.")?;
            return Ok(None);
        };

        if !is_valid_phone(&phone) {
            terminal.print_line(&format!(
                "Invalid format. Use + followed by 8-15 digits. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        return Ok(Some(phone));
    }

    terminal.print_line(
        "Phone step failed too many times. Please restart tgfold and try again later.",
    )?;
    Ok(None)
}

async fn request_code(
    terminal: &mut dyn Terminal,
    auth_client: &mut dyn TelegramAuthClient,
    phone: &str,
    attempts: usize,
) -> io::Result<Option<AuthCodeToken>> {
    for attempt in 1..=attempts {
        match auth_client.request_login_code(phone).await {
            Ok(token) => {
                terminal
                    .print_line("Code has been sent in Telegram. Continue to the next step.")?;
                return Ok(Some(token));
            }
            Err(err) => {
                if !handle_backend_error(terminal, err, attempt, attempts, "phone")? {
                    return Ok(None);
                }
            }
        }
    }

    terminal.print_line("Unable to request login code. Please restart tgfold later.")?;
    Ok(None)
}

async fn collect_code(
    terminal: &mut dyn Terminal,
    auth_client: &mut dyn TelegramAuthClient,
    phone: &str,
    mut token: AuthCodeToken,
    retry_policy: &RetryPolicy,
) -> io::Result<Option<SignInOutcome>> {
    let attempts = retry_policy.code_attempts;
    let mut attempt = 0;
    let mut refreshes = 0;

    while attempt < attempts {
        terminal.print_line("Step 2/3: enter the code from Telegram (digits only).")?;
        let Some(code) = terminal.prompt_line("Code: ")? else {
            terminal.print_line("Input cancelled (EOF). Run tgfold again to retry.")?;
            return Ok(None);
        };

        if !is_valid_code(&code) {
            attempt += 1;
            terminal.print_line(&format!(
                "Invalid code format. Use 3-8 digits. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        match auth_client.sign_in_with_code(&token, &code).await {
            Ok(outcome) => return Ok(Some(outcome)),
            Err(AuthBackendError::CodeExpired) if refreshes < MAX_CODE_REFRESHES => {
                refreshes += 1;
                tracing::info!(refreshes, "login code expired, requesting a new one");
                terminal.print_line("AUTH_CODE_EXPIRED: that code expired. Requesting a new one.")?;

                let Some(fresh) =
                    request_code(terminal, auth_client, phone, retry_policy.phone_attempts)
                        .await?
                else {
                    return Ok(None);
                };
                token = fresh;
            }
            Err(err) => {
                attempt += 1;
                if !handle_backend_error(terminal, err, attempt, attempts, "code")? {
                    return Ok(None);
                }
            }
        }
    }

    terminal.print_line("Code step failed too many times. Please restart tgfold.")?;
    Ok(None)
}

async fn collect_password(
    terminal: &mut dyn Terminal,
    auth_client: &mut dyn TelegramAuthClient,
    attempts: usize,
) -> io::Result<Option<()>> {
    for attempt in 1..=attempts {
        terminal.print_line("Step 3/3: 2FA password is required for this account.")?;
        let Some(password) = terminal.prompt_secret("2FA password: ")? else {
            terminal.print_line("Input cancelled (EOF). Run tgfold again to retry.")?;
            return Ok(None);
        };

        if password.trim().is_empty() {
            terminal.print_line(&format!(
                "Password cannot be empty. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?;
            continue;
        }

        match auth_client.verify_password(&password).await {
            Ok(()) => return Ok(Some(())),
            Err(err) => {
                if !handle_backend_error(terminal, err, attempt, attempts, "2fa")? {
                    return Ok(None);
                }
            }
        }
    }

    terminal.print_line("2FA step failed too many times. Please restart tgfold.")?;
    Ok(None)
}

/// Prints a one-line diagnostic and tells whether the step may be retried.
fn handle_backend_error(
    terminal: &mut dyn Terminal,
    error: AuthBackendError,
    attempt: usize,
    max_attempts: usize,
    step: &str,
) -> io::Result<bool> {
    let attempts_left = max_attempts.saturating_sub(attempt);

    match error {
        AuthBackendError::InvalidPhone => {
            terminal.print_line(&format!(
                "AUTH_INVALID_PHONE: Telegram rejected the phone. Check number and retry. Attempts left: {attempts_left}"
            ))?;
            Ok(attempts_left > 0)
        }
        AuthBackendError::InvalidCode => {
            terminal.print_line(&format!(
                "AUTH_INVALID_CODE: The code is incorrect. Attempts left: {attempts_left}"
            ))?;
            Ok(attempts_left > 0)
        }
        AuthBackendError::CodeExpired => {
            terminal.print_line(
                "AUTH_CODE_EXPIRED: Login codes keep expiring. Please restart tgfold later.",
            )?;
            Ok(false)
        }
        AuthBackendError::WrongPassword => {
            terminal.print_line(&format!(
                "AUTH_WRONG_2FA: Incorrect 2FA password. Attempts left: {attempts_left}"
            ))?;
            Ok(attempts_left > 0)
        }
        AuthBackendError::InvalidApiCredentials => {
            terminal.print_line(
                "AUTH_INVALID_API_CREDENTIALS: api_id/api_hash were rejected. Fix [telegram] in the config file.",
            )?;
            Ok(false)
        }
        AuthBackendError::Timeout => {
            terminal.print_line(&format!(
                "AUTH_TIMEOUT: Request timed out at {step} step. Check network and retry. Attempts left: {attempts_left}"
            ))?;
            Ok(attempts_left > 0)
        }
        AuthBackendError::FloodWait { seconds } => {
            terminal.print_line(&format!(
                "AUTH_FLOOD_WAIT: Too many attempts. Wait about {seconds}s before retrying."
            ))?;
            Ok(false)
        }
        AuthBackendError::Transient { code, .. } => {
            let safe_code = sanitize_error_code(code);
            terminal.print_line(&format!(
                "{safe_code}: temporary authorization issue at {step} step. Please retry. Attempts left: {attempts_left}"
            ))?;
            Ok(attempts_left > 0)
        }
    }
}

fn is_valid_code(code: &str) -> bool {
    (3..=8).contains(&code.len()) && code.chars().all(|ch| ch.is_ascii_digit())
}
