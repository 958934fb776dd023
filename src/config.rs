use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub bot_token: String,
    pub webhook_secret: String,
    pub admins: AdminConfig,
    pub studio: StudioInfo,
}

/// The three fixed administrator identities. Nails bookings go to the nails
/// admin, everything else to the beauty admin, and the head admin sees all.
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub nails_admin: i64,
    pub beauty_admin: i64,
    pub head_admin: i64,
}

impl AdminConfig {
    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.nails_admin || user_id == self.beauty_admin || user_id == self.head_admin
    }
}

/// Studio contact card shown by the contacts command.
#[derive(Clone, Debug)]
pub struct StudioInfo {
    pub phone: String,
    pub instagram: String,
    pub address: String,
    pub hours: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbot.db".to_string()),
            bot_token: env::var("BOT_TOKEN").unwrap_or_default(),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            admins: AdminConfig {
                nails_admin: env_i64("ADMIN_NAILS", 1373071419),
                beauty_admin: env_i64("ADMIN_BEAUTY", 1094720117),
                head_admin: env_i64("ADMIN_HEAD", 130208292),
            },
            studio: StudioInfo {
                phone: env::var("STUDIO_PHONE")
                    .unwrap_or_else(|_| "+7 (978) 859-03-84".to_string()),
                instagram: env::var("STUDIO_INSTAGRAM")
                    .unwrap_or_else(|_| "@ego_sevastopol".to_string()),
                address: env::var("STUDIO_ADDRESS")
                    .unwrap_or_else(|_| "40 Bastionnaya St, 2nd floor, Sevastopol".to_string()),
                hours: env::var("STUDIO_HOURS")
                    .unwrap_or_else(|_| "Daily from 09:00 to 19:00".to_string()),
            },
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
