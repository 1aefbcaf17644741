pub mod gemini;
#[cfg(test)]
pub mod scripted;

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::GatewayConfig;
use crate::domain::models::GatewayName;
use crate::domain::models::SharedGateway;

pub struct GatewayManager {}

impl GatewayManager {
    pub fn get(name: GatewayName) -> Result<SharedGateway> {
        let config = GatewayConfig::from_config()?;
        tracing::debug!(gateway = %name, model = %config.model_id, "Building gateway");

        match name {
            GatewayName::Gemini => return Ok(Arc::new(gemini::Gemini::new(config))),
        }
    }
}
