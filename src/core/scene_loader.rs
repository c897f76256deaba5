// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use nalgebra as na;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::depth::DepthBuffer;
use crate::core::intersector::VolumePlacement;
use crate::core::labels::LabelPalette;
use crate::core::scene::{ClipPlane, Scene, VolumeContent, VolumeObject};
use crate::core::texture::Texture;
use crate::core::transfer::{IntensityDomain, TransferFunction};
use crate::core::volume::Volume;
use crate::integrators::raymarching::RaymarchSettings;
use crate::math::constants::{Float, Matrix4f, Vector3f, Vector4f};
use crate::math::transform::Transform;
use crate::sensors::perspective::PerspectiveCamera;
use crate::textures::gradient::GradientTexture;
use crate::textures::image::ImageTexture;
use crate::volumes::const_volume::ConstantVolume;
use crate::volumes::grid_volume::GridVolume;
use crate::volumes::label_volume::LabelVolume;
use crate::volumes::VolumeFilterMode;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "io error: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "missing field: {}", field),
        }
    }
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub struct SceneLoadResult {
    pub scene: Scene,
    /// Integrator settings, defaults when the file has no `<integrator>`.
    pub settings: RaymarchSettings,
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    log::info!("Loading scene from {}.", path.display());
    parse_scene(&xml, base_dir)
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Root,
    Integrator,
    Sensor,
    Volume,
    Depth,
}

#[derive(Clone, Copy, PartialEq)]
enum TransformTarget {
    SensorToWorld,
    VolumeToWorld,
    VolumeExternal,
}

#[derive(Clone, Copy, PartialEq)]
enum VolumeKind {
    Intensity,
    Label,
}

enum IlluminationSource {
    File(String),
    Value(Float),
}

struct VolumeBuilder {
    kind: VolumeKind,
    id: Option<String>,
    filename: Option<String>,
    filter: VolumeFilterMode,
    palette: LabelPalette,
    resolution: [Option<usize>; 3],
    to_world: Matrix4f,
    external: Option<Matrix4f>,
    scale: Option<Float>,
    domain: IntensityDomain,
    tf_filename: Option<String>,
    tf_stops: Vec<(Float, Vector4f)>,
    has_transfer_function: bool,
    illumination: Option<IlluminationSource>,
    clip: Option<ClipPlane>,
}

impl VolumeBuilder {
    fn new(kind: VolumeKind, id: Option<String>) -> Self {
        Self {
            kind,
            id,
            filename: None,
            filter: VolumeFilterMode::Trilinear,
            palette: LabelPalette::Render,
            resolution: [None, None, None],
            to_world: Matrix4f::identity(),
            external: None,
            scale: None,
            domain: IntensityDomain::default(),
            tf_filename: None,
            tf_stops: Vec::new(),
            has_transfer_function: false,
            illumination: None,
            clip: None,
        }
    }

    fn build(self, base_dir: &Path) -> Result<VolumeObject, SceneLoadError> {
        let filename = self.filename.as_deref().ok_or(SceneLoadError::MissingField("volume.filename"))?;
        let filename = resolve_path(base_dir, filename);

        let content = match self.kind {
            VolumeKind::Intensity => {
                if !self.has_transfer_function {
                    return Err(SceneLoadError::MissingField("volume.transfer_function"));
                }
                let data = GridVolume::from_file(&filename)
                    .map_err(SceneLoadError::Parse)?
                    .with_filter_mode(self.filter);
                let (lo, hi) = data.value_range();
                log::info!("Intensity range [{}, {}], transfer domain [{}, {}].", lo, hi, self.domain.min, self.domain.max);

                let texture: Arc<dyn Texture> = match &self.tf_filename {
                    Some(tf) => {
                        let tf = resolve_path(base_dir, tf);
                        Arc::new(ImageTexture::from_file_with_srgb(&tf, false).map_err(SceneLoadError::Parse)?)
                    }
                    None => Arc::new(GradientTexture::new(self.tf_stops).map_err(SceneLoadError::Parse)?),
                };
                let illumination: Option<Arc<dyn Volume>> = match self.illumination {
                    Some(IlluminationSource::File(file)) => {
                        let file = resolve_path(base_dir, &file);
                        Some(Arc::new(GridVolume::from_file(&file).map_err(SceneLoadError::Parse)?))
                    }
                    Some(IlluminationSource::Value(value)) => Some(Arc::new(ConstantVolume::new(value))),
                    None => None,
                };
                VolumeContent::Intensity {
                    data: Arc::new(data),
                    transfer_function: Arc::new(TransferFunction::new(texture, self.domain)),
                    illumination,
                }
            }
            VolumeKind::Label => {
                let volume = if filename.to_ascii_lowercase().ends_with(".vol") {
                    let grid = GridVolume::from_file(&filename).map_err(SceneLoadError::Parse)?;
                    LabelVolume::from_volume(&grid).map_err(SceneLoadError::Parse)?
                } else {
                    let xres = self.resolution[0].ok_or(SceneLoadError::MissingField("volume.xres"))?;
                    let yres = self.resolution[1].ok_or(SceneLoadError::MissingField("volume.yres"))?;
                    let zres = self.resolution[2].ok_or(SceneLoadError::MissingField("volume.zres"))?;
                    LabelVolume::from_raw_file(&filename, xres, yres, zres).map_err(SceneLoadError::Parse)?
                };
                if self.filter != VolumeFilterMode::Nearest {
                    log::debug!("Label volumes are always sampled nearest.");
                }
                VolumeContent::Labels { volume: Arc::new(volume), palette: self.palette }
            }
        };

        let placement = match (self.scale, self.external) {
            (Some(_), Some(_)) => {
                return Err(SceneLoadError::Parse(String::from("volume cannot combine scale with an external transform")));
            }
            (Some(factor), None) => {
                if !(factor > 0.0) {
                    return Err(SceneLoadError::Parse(format!("volume scale must be positive: {}", factor)));
                }
                VolumePlacement::Scaled(factor)
            }
            (None, Some(external)) => VolumePlacement::External(Transform::new(external).inverse()),
            (None, None) => VolumePlacement::Own,
        };

        log::info!("Volume: {}.", content.describe());
        let mut object = VolumeObject::new(Transform::new(self.to_world), content)
            .with_placement(placement)
            .with_clip(self.clip);
        if let Some(id) = self.id {
            object = object.with_name(id);
        }
        Ok(object)
    }
}

enum DepthSource {
    File(String),
    Value(Float),
}

fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();

    let mut section = Section::Root;
    let mut in_film = false;
    let mut transform_target: Option<TransformTarget> = None;
    let mut in_transfer_function = false;
    let mut in_illumination = false;

    let mut settings = RaymarchSettings::default();

    let mut fov_deg: Option<Float> = None;
    let mut origin: Option<Vector3f> = None;
    let mut target: Option<Vector3f> = None;
    let mut up: Option<Vector3f> = None;
    let mut width: Option<usize> = None;
    let mut height: Option<usize> = None;

    let mut volume: Option<VolumeBuilder> = None;
    let mut depth_source: Option<DepthSource> = None;

    let mut scene = Scene::new();
    scene.set_base_dir(base_dir.to_path_buf());

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let attrs = read_attributes(&e, &defaults)?;
                match e.name().as_ref() {
                    b"default" => {
                        if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                            defaults.insert(k.clone(), v.clone());
                        }
                    }
                    b"integrator" => {
                        let integrator_type = attrs.get("type").map(|s| s.as_str()).unwrap_or("");
                        if integrator_type != "raymarching" {
                            return Err(SceneLoadError::Parse(format!("unsupported integrator: {}", integrator_type)));
                        }
                        section = Section::Integrator;
                    }
                    b"sensor" => {
                        let sensor_type = attrs.get("type").map(|s| s.as_str()).unwrap_or("");
                        if sensor_type != "perspective" {
                            return Err(SceneLoadError::Parse(format!("unsupported sensor: {}", sensor_type)));
                        }
                        section = Section::Sensor;
                    }
                    b"volume" => {
                        let kind = match attrs.get("type").map(|s| s.as_str()) {
                            Some("intensity") => VolumeKind::Intensity,
                            Some("label") => VolumeKind::Label,
                            other => {
                                return Err(SceneLoadError::Parse(format!("unsupported volume: {}", other.unwrap_or(""))));
                            }
                        };
                        volume = Some(VolumeBuilder::new(kind, attrs.get("id").cloned()));
                        section = Section::Volume;
                    }
                    b"depth" => {
                        section = Section::Depth;
                    }
                    b"film" => {
                        in_film = section == Section::Sensor;
                    }
                    b"transform" => {
                        let name = attrs.get("name").map(|s| s.as_str());
                        transform_target = match (section, name) {
                            (Section::Sensor, Some("to_world")) => Some(TransformTarget::SensorToWorld),
                            (Section::Volume, Some("to_world")) => Some(TransformTarget::VolumeToWorld),
                            (Section::Volume, Some("external")) => {
                                if let Some(v) = volume.as_mut() {
                                    v.external = Some(Matrix4f::identity());
                                }
                                Some(TransformTarget::VolumeExternal)
                            }
                            _ => None,
                        };
                    }
                    b"lookat" => {
                        if transform_target == Some(TransformTarget::SensorToWorld) {
                            origin = Some(parse_vec3(required(&attrs, "origin", "lookat.origin")?)?);
                            target = Some(parse_vec3(required(&attrs, "target", "lookat.target")?)?);
                            up = match attrs.get("up") {
                                Some(u) => Some(parse_vec3(u)?),
                                None => Some(Vector3f::new(0.0, 1.0, 0.0)),
                            };
                        }
                    }
                    b"translate" | b"rotate" | b"scale" | b"matrix" => {
                        let op = transform_op(e.name().as_ref(), &attrs)?;
                        if let Some(v) = volume.as_mut() {
                            match transform_target {
                                Some(TransformTarget::VolumeToWorld) => v.to_world = op * v.to_world,
                                Some(TransformTarget::VolumeExternal) => {
                                    v.external = Some(op * v.external.unwrap_or_else(|| Matrix4f::identity()));
                                }
                                _ => {}
                            }
                        }
                    }
                    b"transfer_function" => {
                        if let Some(v) = volume.as_mut() {
                            in_transfer_function = true;
                            v.has_transfer_function = true;
                            let min = match attrs.get("min") {
                                Some(value) => parse_float(value)?,
                                None => 0.0,
                            };
                            let max = match attrs.get("max") {
                                Some(value) => parse_float(value)?,
                                None => 1.0,
                            };
                            v.domain = IntensityDomain::new(min, max);
                        }
                    }
                    b"stop" => {
                        if let (true, Some(v)) = (in_transfer_function, volume.as_mut()) {
                            let position = parse_float(required(&attrs, "position", "stop.position")?)?;
                            let color = parse_vec4(required(&attrs, "color", "stop.color")?)?;
                            v.tf_stops.push((position, color));
                        }
                    }
                    b"illumination" => {
                        in_illumination = section == Section::Volume;
                    }
                    b"clip" => {
                        if let Some(v) = volume.as_mut() {
                            let center = match attrs.get("center") {
                                Some(c) => parse_vec3(c)?,
                                None => Vector3f::new(0.5, 0.5, 0.5),
                            };
                            let normal = parse_vec3(required(&attrs, "normal", "clip.normal")?)?;
                            v.clip = Some(ClipPlane::new(center, normal));
                        }
                    }
                    b"float" => {
                        let name = required(&attrs, "name", "float.name")?;
                        let value = parse_float(required(&attrs, "value", "float.value")?)?;
                        match (section, name) {
                            (Section::Integrator, "step_size") => settings.step_size = value,
                            (Section::Integrator, "reference_step") => settings.reference_step = Some(value),
                            (Section::Integrator, "termination") => settings.termination = value,
                            (Section::Sensor, "fov") => fov_deg = Some(value),
                            (Section::Volume, "value") if in_illumination => {
                                if let Some(v) = volume.as_mut() {
                                    v.illumination = Some(IlluminationSource::Value(value));
                                }
                            }
                            (Section::Volume, "scale") => {
                                if let Some(v) = volume.as_mut() {
                                    v.scale = Some(value);
                                }
                            }
                            (Section::Depth, "value") => depth_source = Some(DepthSource::Value(value)),
                            _ => log::warn!("Ignoring float property {}.", name),
                        }
                    }
                    b"integer" => {
                        let name = required(&attrs, "name", "integer.name")?;
                        let value = required(&attrs, "value", "integer.value")?;
                        match (section, name) {
                            (Section::Integrator, "max_steps") => settings.max_steps = parse_u32(value)?,
                            (Section::Integrator, "frames") => settings.frames = parse_u32(value)?,
                            (Section::Integrator, "frame_index") => settings.frame_index = parse_u32(value)?,
                            (Section::Sensor, "width") if in_film => width = Some(parse_usize(value)?),
                            (Section::Sensor, "height") if in_film => height = Some(parse_usize(value)?),
                            (Section::Volume, "xres") | (Section::Volume, "yres") | (Section::Volume, "zres") => {
                                if let Some(v) = volume.as_mut() {
                                    let axis = match name {
                                        "xres" => 0,
                                        "yres" => 1,
                                        _ => 2,
                                    };
                                    v.resolution[axis] = Some(parse_usize(value)?);
                                }
                            }
                            _ => log::warn!("Ignoring integer property {}.", name),
                        }
                    }
                    b"boolean" => {
                        let name = required(&attrs, "name", "boolean.name")?;
                        let value = parse_bool(required(&attrs, "value", "boolean.value")?)?;
                        match (section, name) {
                            (Section::Integrator, "jitter") => settings.jitter = value,
                            _ => log::warn!("Ignoring boolean property {}.", name),
                        }
                    }
                    b"string" => {
                        let name = required(&attrs, "name", "string.name")?;
                        let value = required(&attrs, "value", "string.value")?.to_string();
                        match (section, name) {
                            (Section::Volume, "filename") => {
                                if let Some(v) = volume.as_mut() {
                                    if in_transfer_function {
                                        v.tf_filename = Some(value);
                                    } else if in_illumination {
                                        v.illumination = Some(IlluminationSource::File(value));
                                    } else {
                                        v.filename = Some(value);
                                    }
                                }
                            }
                            (Section::Volume, "palette") => {
                                if let Some(v) = volume.as_mut() {
                                    v.palette = LabelPalette::from_name(&value)
                                        .ok_or_else(|| SceneLoadError::Parse(format!("unknown palette: {}", value)))?;
                                }
                            }
                            (Section::Volume, "filter") => {
                                if let Some(v) = volume.as_mut() {
                                    v.filter = match value.as_str() {
                                        "trilinear" => VolumeFilterMode::Trilinear,
                                        "nearest" => VolumeFilterMode::Nearest,
                                        _ => return Err(SceneLoadError::Parse(format!("unknown filter: {}", value))),
                                    };
                                }
                            }
                            (Section::Depth, "filename") => depth_source = Some(DepthSource::File(value)),
                            _ => log::warn!("Ignoring string property {}.", name),
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"integrator" | b"depth" => {
                        section = Section::Root;
                    }
                    b"sensor" => {
                        let fov_deg = fov_deg.take().ok_or(SceneLoadError::MissingField("sensor.fov"))?;
                        let origin = origin.take().ok_or(SceneLoadError::MissingField("sensor.origin"))?;
                        let target = target.take().ok_or(SceneLoadError::MissingField("sensor.target"))?;
                        let up = up.take().unwrap_or_else(|| Vector3f::new(0.0, 1.0, 0.0));
                        let width = width.take().ok_or(SceneLoadError::MissingField("film.width"))?;
                        let height = height.take().ok_or(SceneLoadError::MissingField("film.height"))?;

                        let fov_rad = fov_deg * std::f32::consts::PI / 180.0;
                        let camera = PerspectiveCamera::new(origin, target, up, fov_rad, width, height);
                        scene.add_sensor(Box::new(camera));

                        section = Section::Root;
                        in_film = false;
                        transform_target = None;
                    }
                    b"film" => {
                        in_film = false;
                    }
                    b"transform" => {
                        transform_target = None;
                    }
                    b"transfer_function" => {
                        in_transfer_function = false;
                    }
                    b"illumination" => {
                        in_illumination = false;
                    }
                    b"volume" => {
                        if let Some(builder) = volume.take() {
                            scene.set_volume(builder.build(base_dir)?);
                        }
                        section = Section::Root;
                        transform_target = None;
                        in_transfer_function = false;
                        in_illumination = false;
                    }
                    _ => {}
                }
            }
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    if let Some(source) = depth_source {
        scene.set_depth(Some(load_depth(source, &scene, base_dir)?));
    }

    settings.validate().map_err(SceneLoadError::Parse)?;

    Ok(SceneLoadResult { scene, settings })
}

fn load_depth(source: DepthSource, scene: &Scene, base_dir: &Path) -> Result<DepthBuffer, SceneLoadError> {
    let film = scene.camera(0).map(|s| (s.bitmap().width(), s.bitmap().height()));
    match source {
        DepthSource::Value(value) => {
            let (width, height) = film.ok_or(SceneLoadError::MissingField("sensor"))?;
            Ok(DepthBuffer::constant(width, height, value))
        }
        DepthSource::File(file) => {
            let file = resolve_path(base_dir, &file);
            let depth = DepthBuffer::from_exr(&file).map_err(SceneLoadError::Parse)?;
            if let Some((width, height)) = film {
                if (width, height) != (depth.width(), depth.height()) {
                    log::warn!("Depth buffer is {}x{} but film is {}x{}.", depth.width(), depth.height(), width, height);
                }
            }
            Ok(depth)
        }
    }
}

fn transform_op(name: &[u8], attrs: &HashMap<String, String>) -> Result<Matrix4f, SceneLoadError> {
    let component = |key: &str, default: Float| -> Result<Float, SceneLoadError> {
        match attrs.get(key) {
            Some(v) => parse_float(v),
            None => Ok(default),
        }
    };

    match name {
        b"translate" => {
            let t = Vector3f::new(component("x", 0.0)?, component("y", 0.0)?, component("z", 0.0)?);
            Ok(Matrix4f::new_translation(&t))
        }
        b"rotate" => {
            let axis = Vector3f::new(component("x", 0.0)?, component("y", 0.0)?, component("z", 0.0)?);
            if axis.norm() == 0.0 {
                return Err(SceneLoadError::Parse(String::from("rotate needs a non-zero axis")));
            }
            let angle = component("angle", 0.0)? * std::f32::consts::PI / 180.0;
            Ok(Matrix4f::from_axis_angle(&na::Unit::new_normalize(axis), angle))
        }
        b"scale" => {
            let s = match attrs.get("value") {
                Some(v) => {
                    let u = parse_float(v)?;
                    Vector3f::new(u, u, u)
                }
                None => Vector3f::new(component("x", 1.0)?, component("y", 1.0)?, component("z", 1.0)?),
            };
            Ok(Matrix4f::new_nonuniform_scaling(&s))
        }
        _ => {
            let raw = attrs.get("value").ok_or(SceneLoadError::MissingField("matrix.value"))?;
            let values = raw.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(parse_float)
                .collect::<Result<Vec<Float>, SceneLoadError>>()?;
            if values.len() != 16 {
                return Err(SceneLoadError::Parse(format!("matrix needs 16 values, got {}", values.len())));
            }
            Ok(Matrix4f::from_row_slice(&values))
        }
    }
}

fn read_attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>, SceneLoadError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|err| SceneLoadError::Parse(err.to_string()))?;
        attrs.insert(key, resolve_value(&value, defaults));
    }
    Ok(attrs)
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &str, field: &'static str) -> Result<&'a str, SceneLoadError> {
    attrs.get(key).map(|s| s.as_str()).ok_or(SceneLoadError::MissingField(field))
}

fn resolve_path(base_dir: &Path, filename: &str) -> String {
    if Path::new(filename).is_absolute() {
        filename.to_string()
    } else {
        base_dir.join(filename).to_string_lossy().to_string()
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u32(value: &str) -> Result<u32, SceneLoadError> {
    value.parse::<u32>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SceneLoadError> {
    value.parse::<usize>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, SceneLoadError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SceneLoadError::Parse(format!("invalid boolean: {}", value))),
    }
}

fn parse_floats(value: &str, count: usize, what: &str) -> Result<Vec<Float>, SceneLoadError> {
    let parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty())
        .map(parse_float)
        .collect::<Result<Vec<Float>, SceneLoadError>>()?;
    if parts.len() != count {
        return Err(SceneLoadError::Parse(format!("invalid {}: {}", what, value)));
    }
    Ok(parts)
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let v = parse_floats(value, 3, "vec3")?;
    Ok(Vector3f::new(v[0], v[1], v[2]))
}

fn parse_vec4(value: &str) -> Result<Vector4f, SceneLoadError> {
    let v = parse_floats(value, 4, "vec4")?;
    Ok(Vector4f::new(v[0], v[1], v[2], v[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volumes::grid_volume::tests::write_test_vol;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(name);
        fs::create_dir_all(&dir).expect("temp dir");
        dir
    }

    const SENSOR: &str = r#"
        <sensor type="perspective">
            <float name="fov" value="$fov"/>
            <transform name="to_world">
                <lookat origin="0, 0, -3" target="0, 0, 0" up="0, 1, 0"/>
            </transform>
            <film>
                <integer name="width" value="8"/>
                <integer name="height" value="6"/>
            </film>
        </sensor>"#;

    #[test]
    fn test_parse_intensity_scene() {
        let dir = temp_dir("volmarch_loader_intensity");
        write_test_vol(&dir.join("ct.vol"), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 2, 2, 2, 1);

        let xml = format!(r#"
            <scene>
                <default name="fov" value="60"/>
                <integrator type="raymarching">
                    <float name="step_size" value="0.01"/>
                    <float name="reference_step" value="0.02"/>
                    <integer name="max_steps" value="300"/>
                    <integer name="frames" value="4"/>
                    <integer name="frame_index" value="2"/>
                    <boolean name="jitter" value="false"/>
                </integrator>
                {}
                <volume type="intensity" id="ct">
                    <string name="filename" value="ct.vol"/>
                    <transform name="to_world">
                        <scale value="2"/>
                        <translate x="1" y="0" z="0"/>
                    </transform>
                    <transfer_function min="0" max="7">
                        <stop position="0" color="0,0,0,0"/>
                        <stop position="1" color="1,1,1,1"/>
                    </transfer_function>
                    <illumination>
                        <float name="value" value="0.5"/>
                    </illumination>
                    <clip center="0.5,0.5,0.5" normal="0,0,1"/>
                </volume>
                <depth>
                    <float name="value" value="4.5"/>
                </depth>
            </scene>"#, SENSOR);

        let result = parse_scene(&xml, &dir).expect("scene");
        let settings = result.settings;
        assert_eq!(settings.step_size, 0.01);
        assert_eq!(settings.reference_step(), 0.02);
        assert_eq!(settings.max_steps, 300);
        assert_eq!(settings.frames, 4);
        assert_eq!(settings.frame_index, 2);
        assert!(!settings.jitter);

        let scene = result.scene;
        let sensor = scene.camera(0).expect("sensor");
        assert_eq!((sensor.bitmap().width(), sensor.bitmap().height()), (8, 6));
        assert_eq!(scene.depth_at(7, 5), 4.5);

        let object = scene.volume().expect("volume");
        assert_eq!(object.name.as_deref(), Some("ct"));
        assert_eq!(object.placement, VolumePlacement::Own);
        assert!(object.clip.is_some());
        // Scale first, then translate: world (1, 0, 0) is the cube centre.
        let centre = object.world_to_local().apply_point(Vector3f::new(1.0, 0.0, 0.0));
        assert!(centre.norm() < 1e-5);
        let corner = object.world_to_local().apply_point(Vector3f::new(2.0, 1.0, 1.0));
        assert!((corner - Vector3f::new(0.5, 0.5, 0.5)).norm() < 1e-5);

        match &object.content {
            VolumeContent::Intensity { transfer_function, illumination, .. } => {
                assert_eq!(transfer_function.domain(), IntensityDomain::new(0.0, 7.0));
                assert!((transfer_function.lookup(3.5) - Vector4f::new(0.5, 0.5, 0.5, 0.5)).norm() < 1e-5);
                assert!(illumination.is_some());
            }
            _ => panic!("expected intensity volume"),
        }
    }

    #[test]
    fn test_parse_label_scene_with_external_transform() {
        let dir = temp_dir("volmarch_loader_labels");
        fs::write(dir.join("labels.raw"), vec![0u8, 1, 2, 255]).expect("raw labels");

        let xml = format!(r#"
            <scene>
                <default name="fov" value="45"/>
                {}
                <volume type="label">
                    <string name="filename" value="labels.raw"/>
                    <integer name="xres" value="4"/>
                    <integer name="yres" value="1"/>
                    <integer name="zres" value="1"/>
                    <string name="palette" value="ui"/>
                    <transform name="external">
                        <translate x="5"/>
                    </transform>
                </volume>
            </scene>"#, SENSOR);

        let result = parse_scene(&xml, &dir).expect("scene");
        assert_eq!(result.settings, RaymarchSettings::default());
        let scene = result.scene;
        assert!(scene.depth().is_none());

        let object = scene.volume().expect("volume");
        match object.placement {
            VolumePlacement::External(t) => {
                assert!(t.apply_point(Vector3f::new(5.0, 0.0, 0.0)).norm() < 1e-6);
            }
            _ => panic!("expected external placement"),
        }
        match &object.content {
            VolumeContent::Labels { volume, palette } => {
                assert_eq!(*palette, LabelPalette::Ui);
                assert_eq!(volume.dimensions(), (4, 1, 1));
                assert_eq!(volume.fetch(3, 0, 0), 255);
            }
            _ => panic!("expected label volume"),
        }
    }

    #[test]
    fn test_parse_scaled_placement() {
        let dir = temp_dir("volmarch_loader_scaled");
        fs::write(dir.join("labels.raw"), vec![1u8]).expect("raw labels");
        let xml = r#"
            <scene>
                <volume type="label">
                    <string name="filename" value="labels.raw"/>
                    <integer name="xres" value="1"/>
                    <integer name="yres" value="1"/>
                    <integer name="zres" value="1"/>
                    <float name="scale" value="3"/>
                </volume>
            </scene>"#;
        let scene = parse_scene(xml, &dir).expect("scene").scene;
        assert_eq!(scene.volume().expect("volume").placement, VolumePlacement::Scaled(3.0));
    }

    #[test]
    fn test_parse_errors() {
        let dir = temp_dir("volmarch_loader_errors");

        let bad_integrator = r#"<scene><integrator type="path"/></scene>"#;
        assert!(matches!(parse_scene(bad_integrator, &dir), Err(SceneLoadError::Parse(_))));

        let missing_file = r#"<scene><volume type="label"><string name="palette" value="ui"/></volume></scene>"#;
        assert!(matches!(parse_scene(missing_file, &dir), Err(SceneLoadError::MissingField("volume.filename"))));

        let missing_fov = r#"<scene><sensor type="perspective"><film><integer name="width" value="2"/></film></sensor></scene>"#;
        assert!(matches!(parse_scene(missing_fov, &dir), Err(SceneLoadError::MissingField("sensor.fov"))));

        let bad_frames = r#"<scene><integrator type="raymarching"><integer name="frames" value="12"/></integrator></scene>"#;
        assert!(matches!(parse_scene(bad_frames, &dir), Err(SceneLoadError::Parse(_))));

        let depth_without_sensor = r#"<scene><depth><float name="value" value="1"/></depth></scene>"#;
        assert!(matches!(parse_scene(depth_without_sensor, &dir), Err(SceneLoadError::MissingField("sensor"))));

        assert!(matches!(load_scene(dir.join("does_not_exist.xml")), Err(SceneLoadError::Io(_))));
    }

    #[test]
    fn test_parse_helpers() {
        let mut defaults = HashMap::new();
        defaults.insert(String::from("res"), String::from("256"));
        assert_eq!(resolve_value("$res", &defaults), "256");
        assert_eq!(parse_vec4("1, 0.5, 0, 1").expect("vec4"), Vector4f::new(1.0, 0.5, 0.0, 1.0));
        assert!(parse_vec3("1, 2").is_err());
        assert!(parse_bool("yes").is_err());

        let mut attrs = HashMap::new();
        attrs.insert(String::from("value"), String::from("1 0 0 2  0 1 0 3  0 0 1 4  0 0 0 1"));
        let m = transform_op(b"matrix", &attrs).expect("matrix");
        assert_eq!(m[(0, 3)], 2.0);
        assert_eq!(m[(2, 3)], 4.0);

        let mut attrs = HashMap::new();
        attrs.insert(String::from("y"), String::from("1"));
        attrs.insert(String::from("angle"), String::from("90"));
        let r = transform_op(b"rotate", &attrs).expect("rotate");
        let p = Transform::new(r).apply_point(Vector3f::new(1.0, 0.0, 0.0));
        assert!((p - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }
}
