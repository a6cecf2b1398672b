//! Worker configuration.
//!
//! Everything is optional by design: a worker with no provider credentials and
//! no forward endpoints still serves its surface, degrading side effects to
//! logged no-ops so local development does not require the full provider
//! stack.

use idp_shared::config::require_env;

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// Override for GitHub Enterprise or test servers; `None` means the
    /// public API.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HarborConfig {
    pub base_url: String,
    pub robot_username: String,
    pub robot_password: String,
}

/// External endpoints the AppEnv and secret-binding operations forward to.
#[derive(Debug, Clone, Default)]
pub struct ForwardEndpoints {
    pub appenv_secrets: Option<String>,
    pub appenv_secret_bindings: Option<String>,
    pub appenv_gitops_verify: Option<String>,
    pub secret_bindings_update: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    pub github: Option<GitHubConfig>,
    pub harbor: Option<HarborConfig>,
    pub forwards: ForwardEndpoints,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let github = require_env("GITHUB_TOKEN").map(|token| GitHubConfig {
            token,
            api_url: require_env("GITHUB_API_URL"),
        });

        // Harbor requires the full credential triple; anything less degrades
        // the rotation upstream to a no-op.
        let harbor = match (
            require_env("HARBOR_URL"),
            require_env("HARBOR_ROBOT_USERNAME"),
            require_env("HARBOR_ROBOT_PASSWORD"),
        ) {
            (Some(base_url), Some(robot_username), Some(robot_password)) => Some(HarborConfig {
                base_url,
                robot_username,
                robot_password,
            }),
            _ => None,
        };

        Self {
            github,
            harbor,
            forwards: ForwardEndpoints {
                appenv_secrets: require_env("APPENV_SECRETS_ENDPOINT"),
                appenv_secret_bindings: require_env("APPENV_SECRET_BINDINGS_ENDPOINT"),
                appenv_gitops_verify: require_env("APPENV_GITOPS_VERIFY_ENDPOINT"),
                secret_bindings_update: require_env("SECRET_BINDINGS_UPDATE_ENDPOINT"),
            },
        }
    }
}
