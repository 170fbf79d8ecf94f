use std::path::PathBuf;

use serde::Deserialize;

use crate::traits::SkyroomApp;

/// Configuración del logger (ver [`crate::logging::init`]).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug` o `trace`.
    pub level: String,
    /// Además de stderr, escribe también en este archivo.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Configuración inicial de la ventana.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// RGBA lineal.
    pub clear_color: [f64; 4],
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "SkyRoom".to_string(),
            width: 640,
            height: 480,
            resizable: true,
            vsync: true,
            clear_color: [0.1, 0.1, 0.12, 1.0],
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

/// El punto de entrada principal. Usa el patrón Builder para configurar la app.
pub struct App<A: SkyroomApp> {
    config: AppConfig,
    app_state: A,
}

impl<A: SkyroomApp + 'static> App<A> {
    pub fn new(app_state: A) -> Self {
        Self {
            config: AppConfig::default(),
            app_state,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.config.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Ejecuta el bucle principal de la aplicación hasta que se cierre la
    /// ventana o la app pida salir.
    pub fn run(self) -> anyhow::Result<()> {
        crate::runner::run_internal(self.config, self.app_state)
    }
}
