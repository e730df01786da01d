// src/config/adapters.rs

use std::fs;
use std::io::ErrorKind;
use tracing::warn;

use crate::config::config_manager::AdapterConfig;
use crate::error::{AdapterError, Result};

pub trait ConfigAdapter: Send + Sync {
    fn get_adapter_config(&self) -> Result<AdapterConfig>;
}

/// 从 JSON 文件读取适配器配置
pub struct FileConfigAdapter {
    pub config_file: String,
}

impl FileConfigAdapter {
    pub fn new(config_file: &str) -> Self {
        Self {
            config_file: config_file.to_string(),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    /// 文件不存在时回退到默认 profile；文件存在但格式错误则报错
    fn get_adapter_config(&self) -> Result<AdapterConfig> {
        let content = match fs::read_to_string(&self.config_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("config file {} not found, using default profile", self.config_file);
                return Ok(AdapterConfig::default());
            }
            Err(source) => {
                return Err(AdapterError::ConfigRead {
                    path: self.config_file.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|source| AdapterError::ConfigParse {
            path: self.config_file.clone(),
            source,
        })
    }
}
