//! A shader module plus the pipelines built from it.
//!
//! Pipelines are created on first use for each [`RasterState`] and cached;
//! a successful hot reload swaps the module and empties the cache so the
//! next draw rebuilds them.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use super::{ShaderError, ShaderSource};
use crate::pipeline::{self, TargetFormats};
use crate::state::RasterState;

pub struct ProgramDesc {
    pub label: String,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub bind_group_layouts: Vec<Arc<wgpu::BindGroupLayout>>,
}

pub struct ShaderProgram {
    label: String,
    source: ShaderSource,
    targets: TargetFormats,
    layout: wgpu::PipelineLayout,
    module: wgpu::ShaderModule,
    pipelines: HashMap<RasterState, Arc<wgpu::RenderPipeline>>,
    /// Modification time of the file the current module was built from.
    modified: Option<SystemTime>,
}

impl ShaderProgram {
    /// Compiles `source` and links the pipeline for the default
    /// [`RasterState`], so a module that cannot form a pipeline is rejected
    /// here rather than at the first draw.
    pub fn new(device: &wgpu::Device, source: ShaderSource, desc: ProgramDesc) -> Result<Self, ShaderError> {
        let (code, modified) = read_source(&source)?;
        let module = compile(device, &desc.label, &code)?;
        let layouts: Vec<&wgpu::BindGroupLayout> = desc.bind_group_layouts.iter().map(|l| l.as_ref()).collect();
        let layout = pipeline::create_layout(device, &desc.label, &layouts);
        let targets = TargetFormats {
            color: desc.color_format,
            depth: desc.depth_format,
        };
        let pipelines = link_all(device, &desc.label, &layout, &module, targets, [RasterState::default()])?;

        Ok(Self {
            label: desc.label,
            source,
            targets,
            layout,
            module,
            pipelines,
            modified,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    /// Number of pipelines currently cached.
    pub fn cached_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// The pipeline for `raster`, built on first request.
    pub fn pipeline(
        &mut self,
        device: &wgpu::Device,
        raster: RasterState,
    ) -> Result<Arc<wgpu::RenderPipeline>, ShaderError> {
        if let Some(pipeline) = self.pipelines.get(&raster) {
            return Ok(pipeline.clone());
        }
        log::debug!("Building pipeline '{}' for {:?}", self.label, raster);
        let pipeline = Arc::new(link(device, &self.label, &self.layout, &self.module, self.targets, raster)?);
        self.pipelines.insert(raster, pipeline.clone());
        Ok(pipeline)
    }

    /// Recompiles the program when its source file changed on disk.
    ///
    /// The new module replaces the old one only if every cached pipeline
    /// can be rebuilt from it.  Returns `true` when the module was replaced.
    /// A file that cannot be read, compiled or linked is logged and the
    /// previous module and pipelines stay in use; the same modification is
    /// not retried.
    pub fn reload_if_changed(&mut self, device: &wgpu::Device) -> bool {
        let Some(path) = self.source.path() else {
            return false;
        };
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(time) => time,
            Err(_) => return false,
        };
        if self.modified == Some(modified) {
            return false;
        }
        self.modified = Some(modified);

        let rasters: Vec<RasterState> = self.pipelines.keys().copied().collect();
        let result = read_source(&self.source)
            .and_then(|(code, _)| compile(device, &self.label, &code))
            .and_then(|module| {
                let pipelines = link_all(device, &self.label, &self.layout, &module, self.targets, rasters)?;
                Ok((module, pipelines))
            });
        match result {
            Ok((module, pipelines)) => {
                self.module = module;
                self.pipelines = pipelines;
                log::info!("Reloaded shader '{}' from {}", self.label, path.display());
                true
            }
            Err(err) => {
                log::error!("{err}; keeping the previous version");
                false
            }
        }
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("pipelines", &self.pipelines.len())
            .finish()
    }
}

fn read_source(source: &ShaderSource) -> Result<(String, Option<SystemTime>), ShaderError> {
    match source {
        ShaderSource::Embedded(code) => Ok(((*code).to_owned(), None)),
        ShaderSource::File(path) => {
            let io = |source| ShaderError::Io {
                path: path.clone(),
                source,
            };
            let code = std::fs::read_to_string(path).map_err(io)?;
            let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
            Ok((code, modified))
        }
    }
}

/// Creates the module inside a validation error scope so a bad shader comes
/// back as an error instead of reaching the uncaptured-error handler.
fn compile(device: &wgpu::Device, label: &str, code: &str) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(code.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(ShaderError::Compile {
            label: label.to_owned(),
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Builds one pipeline inside a validation error scope.
fn link(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    targets: TargetFormats,
    raster: RasterState,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = pipeline::create_render_pipeline(device, label, layout, module, targets, raster);
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(ShaderError::Link {
            label: label.to_owned(),
            message: err.to_string(),
        }),
        None => Ok(pipeline),
    }
}

fn link_all(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    targets: TargetFormats,
    rasters: impl IntoIterator<Item = RasterState>,
) -> Result<HashMap<RasterState, Arc<wgpu::RenderPipeline>>, ShaderError> {
    rasters
        .into_iter()
        .map(|raster| Ok((raster, Arc::new(link(device, label, layout, module, targets, raster)?))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_source_has_no_timestamp() {
        let (code, modified) = read_source(&ShaderSource::Embedded("fn main() {}")).unwrap();
        assert_eq!(code, "fn main() {}");
        assert!(modified.is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_source(&ShaderSource::File("no/such/shader.wgsl".into())).unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }
}
