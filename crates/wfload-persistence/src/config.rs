//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    /// Lee `DATABASE_URL` (obligatoria) y los tamaños de pool opcionales.
    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL not set".into()))?;
        let min_connections = parse_var("DATABASE_MIN_CONNECTIONS")?.unwrap_or(DEFAULT_MIN_CONNECTIONS);
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }

    /// Garantiza al menos `needed` conexiones (una por worker más la de
    /// consultas de preparación).
    pub fn with_capacity_for(mut self, needed: u32) -> Self {
        self.max_connections = self.max_connections.max(needed);
        self
    }
}

fn parse_var(name: &str) -> Result<Option<u32>, PersistenceError> {
    match env::var(name) {
        Ok(raw) => raw.trim()
                      .parse()
                      .map(Some)
                      .map_err(|_| PersistenceError::Config(format!("{name} must be a positive integer (got {raw:?})"))),
        Err(_) => Ok(None),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_only_grows() {
        let cfg = DbConfig { url: "postgres://localhost/x".into(),
                             min_connections: 2,
                             max_connections: 16 };
        assert_eq!(cfg.clone().with_capacity_for(4).max_connections, 16);
        assert_eq!(cfg.with_capacity_for(25).max_connections, 25);
    }
}
