use clap::Args;

use crate::auth::{generate_jwt, Claims};
use crate::config::{self, SecurityConfig};

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Tenant the token acts for")]
    pub tenant: String,

    #[arg(long, help = "User id recorded as the audit actor")]
    pub user: String,

    #[arg(long, help = "Lifetime in hours [default: SECURITY_JWT_EXPIRY_HOURS for APP_ENV]")]
    pub hours: Option<u64>,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true, help = "Signing secret shared with the server")]
    pub secret: String,
}

pub fn handle(args: TokenArgs) -> anyhow::Result<()> {
    let hours = expiry_hours(args.hours, &config::config().security);
    let claims = Claims::new(args.tenant, args.user, hours);
    let token = generate_jwt(&claims, &args.secret)?;
    println!("{}", token);
    Ok(())
}

fn expiry_hours(requested: Option<u64>, security: &SecurityConfig) -> u64 {
    requested.unwrap_or(security.jwt_expiry_hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(jwt_expiry_hours: u64) -> SecurityConfig {
        SecurityConfig {
            enable_cors: false,
            cors_origins: Vec::new(),
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours,
        }
    }

    #[test]
    fn lifetime_defaults_to_configured_expiry() {
        assert_eq!(expiry_hours(None, &security(4)), 4);
    }

    #[test]
    fn explicit_hours_win() {
        assert_eq!(expiry_hours(Some(1), &security(168)), 1);
    }
}
