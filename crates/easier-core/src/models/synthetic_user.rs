use serde::{Deserialize, Serialize};

use super::token_count::TokenCount;

const NOT_AVAILABLE: &str = "N/A";

/// Response of `/users`.
///
/// When the service fails to parse its own generated output it answers with
/// an empty `users` list plus `error` and the unparsed `raw_response`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<SyntheticUser>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub raw_response: Option<String>,
    #[serde(default)]
    pub token_counts: Option<TokenCount>,
}

/// What a `/users` call produced once the error shape is taken into account.
#[derive(Debug, Clone, PartialEq)]
pub enum UsersOutcome {
    Users(Vec<SyntheticUserRow>),
    Failed {
        error: String,
        raw_response: Option<String>,
    },
}

impl UsersResponse {
    pub fn into_outcome(self) -> UsersOutcome {
        match self.error {
            Some(error) => UsersOutcome::Failed {
                error,
                raw_response: self.raw_response.filter(|raw| !raw.is_empty()),
            },
            None => UsersOutcome::Users(self.users.iter().map(SyntheticUser::to_row).collect()),
        }
    }
}

/// A generated user as the service returns it. Any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntheticUser {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub salary: Option<serde_json::Value>,
}

/// Display-ready synthetic user with every gap filled by `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticUserRow {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub date_of_birth: String,
    pub salary: String,
}

impl SyntheticUser {
    pub fn to_row(&self) -> SyntheticUserRow {
        SyntheticUserRow {
            firstname: text_or_na(&self.firstname),
            lastname: text_or_na(&self.lastname),
            email: text_or_na(&self.email),
            date_of_birth: text_or_na(&self.date_of_birth),
            salary: format_salary(self.salary.as_ref()),
        }
    }
}

fn text_or_na(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_salary(value: Option<&serde_json::Value>) -> String {
    let amount = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        // Zero counts as missing.
        Some(amount) if amount != 0.0 => format!("${amount:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}
