use crate::usecases::guided_auth::AuthBackendError;

/// Authorization state of the TDLib client, keyed by the `@type` of
/// `authorizationState*` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    WaitParameters,
    WaitPhoneNumber,
    WaitCode,
    WaitPassword,
    Ready,
    Closing,
    Closed,
    /// A step this tool does not drive, e.g. registration or email login.
    Unsupported,
}

impl AuthState {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "authorizationStateWaitTdlibParameters" => Self::WaitParameters,
            "authorizationStateWaitPhoneNumber" => Self::WaitPhoneNumber,
            "authorizationStateWaitCode" => Self::WaitCode,
            "authorizationStateWaitPassword" => Self::WaitPassword,
            "authorizationStateReady" => Self::Ready,
            "authorizationStateLoggingOut" | "authorizationStateClosing" => Self::Closing,
            "authorizationStateClosed" => Self::Closed,
            _ => Self::Unsupported,
        }
    }

    /// States in which the client waits for user input or is usable.
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Unknown | Self::WaitParameters)
    }
}

pub(super) fn map_request_code_error(code: i32, message: &str) -> AuthBackendError {
    let msg = message.to_ascii_lowercase();

    if let Some(error) = map_common_error(code, &msg) {
        return error;
    }

    if msg.contains("phone") {
        return AuthBackendError::InvalidPhone;
    }

    AuthBackendError::Transient {
        code: "AUTH_REQUEST_CODE_FAILED",
        message: "telegram rejected login code request".to_owned(),
    }
}

pub(super) fn map_sign_in_error(code: i32, message: &str) -> AuthBackendError {
    let msg = message.to_ascii_lowercase();

    if is_expired_code_error(&msg) {
        return AuthBackendError::CodeExpired;
    }

    if is_invalid_code_error(&msg) {
        return AuthBackendError::InvalidCode;
    }

    if let Some(error) = map_common_error(code, &msg) {
        return error;
    }

    AuthBackendError::Transient {
        code: "AUTH_SIGN_IN_FAILED",
        message: "telegram sign-in failed".to_owned(),
    }
}

pub(super) fn map_password_error(code: i32, message: &str) -> AuthBackendError {
    let msg = message.to_ascii_lowercase();

    if let Some(error) = map_common_error(code, &msg) {
        return error;
    }

    if msg.contains("password") {
        return AuthBackendError::WrongPassword;
    }

    AuthBackendError::Transient {
        code: "AUTH_PASSWORD_VERIFY_FAILED",
        message: "telegram password verification failed".to_owned(),
    }
}

/// Errors any auth step can run into. `msg` is lowercase.
fn map_common_error(code: i32, msg: &str) -> Option<AuthBackendError> {
    if code == 429 || msg.contains("flood") || msg.contains("too many requests") {
        return Some(AuthBackendError::FloodWait {
            seconds: parse_flood_wait_seconds(msg).unwrap_or(0),
        });
    }

    if msg.contains("api_id") || msg.contains("api_hash") {
        return Some(AuthBackendError::InvalidApiCredentials);
    }

    if msg.contains("timeout") || msg.contains("timed out") {
        return Some(AuthBackendError::Timeout);
    }

    None
}

fn is_invalid_code_error(message: &str) -> bool {
    message.contains("invalid code")
        || message.contains("phone_code_invalid")
        || message.contains("phone code invalid")
        || message.contains("phone_code_empty")
}

fn is_expired_code_error(message: &str) -> bool {
    message.contains("phone_code_expired")
        || message.contains("phone code expired")
        || message.contains("code expired")
}

fn parse_flood_wait_seconds(message: &str) -> Option<u32> {
    message
        .split(|ch: char| !ch.is_ascii_digit())
        .find_map(|part| {
            (!part.is_empty())
                .then(|| part.parse::<u32>().ok())
                .flatten()
        })
}
