//! Scene loading.
//!
//! A scene is a JSON description (lights, viewport, optional analytic
//! spheres) that may reference a Wavefront OBJ model with its MTL library:
//!
//! ```json
//! {
//!   "ModelName": "room.obj",
//!   "Lights": [{ "Position": {"X": 0, "Y": 5, "Z": 0}, "Power": 10,
//!                "Ref": {"Power": 10, "Distance": 1} }],
//!   "Viewport": { "Origin": {"X": 0, "Y": 1, "Z": -5},
//!                 "TopLeft": {"X": -1, "Y": 2, "Z": -4},
//!                 "BottomLeft": {"X": -1, "Y": 0, "Z": -4},
//!                 "TopRight": {"X": 1, "Y": 2, "Z": -4},
//!                 "Width": 640, "Height": 640 }
//! }
//! ```

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kdray_math::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::light::{Light, LightReference};
use crate::material::{Color, Material};
use crate::viewport::Viewport;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OBJ error in {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Material library error: {0}")]
    Mtl(tobj::LoadError),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid sphere #{index}: {reason}")]
    InvalidSphere { index: usize, reason: String },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// One triangle of the loaded model.
#[derive(Debug, Clone)]
pub struct TriangleSpec {
    pub positions: [Vec3; 3],
    /// Texture coordinates (z unused), zero when the model has none
    pub texture_coords: [Vec3; 3],
    pub material: Arc<Material>,
}

/// An analytic sphere declared in the scene description.
#[derive(Debug, Clone)]
pub struct SphereSpec {
    pub center: Vec3,
    pub radius: f64,
    pub material: Arc<Material>,
}

/// Everything the renderer needs to build a scene.
#[derive(Debug, Clone)]
pub struct SceneDescription {
    pub triangles: Vec<TriangleSpec>,
    pub spheres: Vec<SphereSpec>,
    /// Every distinct material referenced by the geometry
    pub materials: Vec<Arc<Material>>,
    pub lights: Vec<Light>,
    pub viewport: Viewport,
    /// OBJ model referenced by the description, relative to it
    pub model_name: Option<String>,
}

// =============================================================================
// JSON format
// =============================================================================

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
struct VectorDef {
    x: f64,
    y: f64,
    z: f64,
}

impl From<VectorDef> for Vec3 {
    fn from(v: VectorDef) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
struct ColorDef {
    r: f64,
    g: f64,
    b: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ReferenceDef {
    power: f64,
    distance: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LightDef {
    #[serde(rename = "Ref")]
    reference: ReferenceDef,
    power: f64,
    position: VectorDef,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ViewportDef {
    origin: VectorDef,
    top_left: VectorDef,
    bottom_left: VectorDef,
    top_right: VectorDef,
    width: u32,
    height: u32,
}

fn opaque() -> f64 {
    1.0
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct MaterialDef {
    #[serde(default)]
    name: String,
    color: ColorDef,
    #[serde(default)]
    reflect: f64,
    #[serde(default)]
    refract: f64,
    #[serde(default = "opaque")]
    alpha: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SphereDef {
    center: VectorDef,
    radius: f64,
    material: MaterialDef,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SceneFile {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    lights: Vec<LightDef>,
    viewport: ViewportDef,
    #[serde(default)]
    spheres: Vec<SphereDef>,
}

// =============================================================================
// Loading
// =============================================================================

/// Load a scene description and the OBJ model it references.
///
/// The model path is resolved relative to the description file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<SceneDescription> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let mut scene = parse_description(&json)?;

    if let Some(model_name) = &scene.model_name {
        let model_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(model_name);
        log::info!("Loading model {}", model_path.display());

        let options = obj_load_options();
        let (models, materials) =
            tobj::load_obj(&model_path, &options).map_err(|source| LoadError::Obj {
                path: model_path.clone(),
                source,
            })?;
        let (triangles, materials) = convert_models(&models, materials)?;
        scene.add_model(triangles, materials);
    }

    log::info!(
        "Loaded scene: {} triangles, {} spheres, {} materials, {} lights",
        scene.triangles.len(),
        scene.spheres.len(),
        scene.materials.len(),
        scene.lights.len()
    );
    Ok(scene)
}

/// Parse a scene description from JSON text.
///
/// The referenced model (if any) is not loaded; see [`load_scene`].
pub fn parse_description(json: &str) -> LoadResult<SceneDescription> {
    let file: SceneFile = serde_json::from_str(json)?;

    let vp = file.viewport;
    if vp.width == 0 || vp.height == 0 {
        return Err(LoadError::InvalidViewport(format!(
            "resolution must be non-zero, got {}x{}",
            vp.width, vp.height
        )));
    }
    let viewport = Viewport {
        origin: vp.origin.into(),
        top_left: vp.top_left.into(),
        bottom_left: vp.bottom_left.into(),
        top_right: vp.top_right.into(),
        width: vp.width,
        height: vp.height,
    };

    let lights = file
        .lights
        .into_iter()
        .map(|l| {
            Light::new(
                l.position.into(),
                l.power,
                LightReference {
                    power: l.reference.power,
                    distance: l.reference.distance,
                },
            )
        })
        .collect();

    let mut materials = Vec::new();
    let mut spheres = Vec::with_capacity(file.spheres.len());
    for (index, def) in file.spheres.into_iter().enumerate() {
        if !(def.radius.is_finite() && def.radius > 0.0) {
            return Err(LoadError::InvalidSphere {
                index,
                reason: format!("radius must be positive, got {}", def.radius),
            });
        }
        let m = def.material;
        let material = Arc::new(Material::new(
            m.name,
            Color::new(m.color.r, m.color.g, m.color.b),
            m.reflect,
            m.refract,
            m.alpha,
        ));
        materials.push(material.clone());
        spheres.push(SphereSpec {
            center: def.center.into(),
            radius: def.radius,
            material,
        });
    }

    Ok(SceneDescription {
        triangles: Vec::new(),
        spheres,
        materials,
        lights,
        viewport,
        model_name: file.model_name,
    })
}

/// Load OBJ geometry from a reader, with an optional in-memory MTL library.
pub fn load_obj_from_buf<B: BufRead>(
    obj: &mut B,
    mtl: Option<&str>,
) -> LoadResult<(Vec<TriangleSpec>, Vec<Arc<Material>>)> {
    let options = obj_load_options();
    let (models, materials) = tobj::load_obj_buf(obj, &options, |_| match mtl {
        Some(text) => tobj::load_mtl_buf(&mut text.as_bytes()),
        None => Err(tobj::LoadError::OpenFileFailed),
    })
    .map_err(|source| LoadError::Obj {
        path: PathBuf::from("<memory>"),
        source,
    })?;
    convert_models(&models, materials)
}

impl SceneDescription {
    /// Append model geometry and its materials.
    pub fn add_model(&mut self, triangles: Vec<TriangleSpec>, materials: Vec<Arc<Material>>) {
        self.triangles.extend(triangles);
        self.materials.extend(materials);
    }

    /// Total number of primitives the renderer will build.
    pub fn object_count(&self) -> usize {
        self.triangles.len() + self.spheres.len()
    }
}

fn obj_load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Turn tobj models into triangles, resolving each mesh's material.
fn convert_models(
    models: &[tobj::Model],
    materials: Result<Vec<tobj::Material>, tobj::LoadError>,
) -> LoadResult<(Vec<TriangleSpec>, Vec<Arc<Material>>)> {
    // Only fails when the model names a library that cannot be loaded.
    let materials: Vec<Arc<Material>> = materials
        .map_err(LoadError::Mtl)?
        .iter()
        .map(|m| Arc::new(convert_material(m)))
        .collect();
    let fallback = Arc::new(Material::default());

    let mut triangles = Vec::new();
    for model in models {
        let mesh = &model.mesh;
        let material = match mesh.material_id {
            Some(id) => materials.get(id).cloned().unwrap_or_else(|| {
                log::warn!(
                    "Model '{}' references missing material #{}, using default",
                    model.name,
                    id
                );
                fallback.clone()
            }),
            None => fallback.clone(),
        };

        let position = |i: u32| {
            let i = i as usize * 3;
            Vec3::new(
                mesh.positions[i] as f64,
                mesh.positions[i + 1] as f64,
                mesh.positions[i + 2] as f64,
            )
        };
        let texcoord = |i: u32| {
            let i = i as usize * 2;
            match mesh.texcoords.get(i..i + 2) {
                Some(uv) => Vec3::new(uv[0] as f64, uv[1] as f64, 0.0),
                None => Vec3::ZERO,
            }
        };

        for face in mesh.indices.chunks_exact(3) {
            triangles.push(TriangleSpec {
                positions: [position(face[0]), position(face[1]), position(face[2])],
                texture_coords: [texcoord(face[0]), texcoord(face[1]), texcoord(face[2])],
                material: material.clone(),
            });
        }
    }

    let mut all_materials = materials;
    if triangles.iter().any(|t| Arc::ptr_eq(&t.material, &fallback)) {
        all_materials.push(fallback);
    }
    Ok((triangles, all_materials))
}

/// Map an MTL entry onto the renderer's material model.
///
/// `illum` 3-7 enable ray-traced reflection (weight = mean of `Ks`);
/// `illum` 6 and 7 also enable refraction with `Ni` as the index.
fn convert_material(mtl: &tobj::Material) -> Material {
    let color = mtl
        .diffuse
        .map(|kd| Color::new(kd[0] as f64, kd[1] as f64, kd[2] as f64))
        .unwrap_or(Color::splat(0.5));
    let alpha = mtl.dissolve.map(|d| d as f64).unwrap_or(1.0);
    let illum = mtl.illumination_model.unwrap_or(0);

    let reflect = if (3..=7).contains(&illum) {
        mtl.specular
            .map(|ks| (ks[0] + ks[1] + ks[2]) as f64 / 3.0)
            .unwrap_or(0.0)
    } else {
        0.0
    };
    let refract = if matches!(illum, 6 | 7) {
        mtl.optical_density.map(|ni| ni as f64).unwrap_or(0.0)
    } else {
        0.0
    };

    Material::new(mtl.name.clone(), color, reflect, refract, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialKind;

    const DESCRIPTION: &str = r#"{
        "ModelName": "quad.obj",
        "Lights": [
            {"Position": {"X": 0, "Y": 5, "Z": 0}, "Power": 10,
             "Ref": {"Power": 10, "Distance": 1}}
        ],
        "Viewport": {
            "Origin": {"X": 0, "Y": 0, "Z": -5},
            "TopLeft": {"X": -1, "Y": 1, "Z": -4},
            "BottomLeft": {"X": -1, "Y": -1, "Z": -4},
            "TopRight": {"X": 1, "Y": 1, "Z": -4},
            "Width": 32, "Height": 16
        },
        "Spheres": [
            {"Center": {"X": 0, "Y": 0, "Z": 2}, "Radius": 0.5,
             "Material": {"Name": "glass", "Color": {"R": 1, "G": 1, "B": 1},
                          "Refract": 1.5}}
        ]
    }"#;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl red
f 1/1 2/2 3/3 4/4
";

    const QUAD_MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
illum 2

newmtl mirror
Kd 0.2 0.2 0.2
Ks 0.8 0.8 0.8
illum 3
";

    #[test]
    fn test_parse_description() {
        let scene = parse_description(DESCRIPTION).unwrap();

        assert_eq!(scene.model_name.as_deref(), Some("quad.obj"));
        assert_eq!(scene.viewport.width, 32);
        assert_eq!(scene.viewport.height, 16);
        assert_eq!(scene.viewport.top_right, Vec3::new(1.0, 1.0, -4.0));

        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.lights[0].position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(scene.lights[0].reference.distance, 1.0);

        assert_eq!(scene.spheres.len(), 1);
        let glass = &scene.spheres[0].material;
        assert_eq!(glass.kind(), MaterialKind::ReflectRefract);
        assert_eq!(glass.alpha(), 1.0);
        assert!(scene.triangles.is_empty());
    }

    #[test]
    fn test_parse_description_rejects_empty_viewport() {
        let json = DESCRIPTION.replace("\"Width\": 32", "\"Width\": 0");
        let err = parse_description(&json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidViewport(_)));
    }

    #[test]
    fn test_parse_description_rejects_bad_sphere() {
        let json = DESCRIPTION.replace("\"Radius\": 0.5", "\"Radius\": -1");
        let err = parse_description(&json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidSphere { index: 0, .. }));
    }

    #[test]
    fn test_parse_description_malformed_json() {
        let err = parse_description("{ \"Lights\": [").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_load_obj_triangulates_with_materials() {
        let (triangles, materials) =
            load_obj_from_buf(&mut QUAD_OBJ.as_bytes(), Some(QUAD_MTL)).unwrap();

        assert_eq!(triangles.len(), 2);
        assert_eq!(materials.len(), 2);

        let red = &triangles[0].material;
        assert_eq!(red.name(), "red");
        assert_eq!(red.color(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(red.kind(), MaterialKind::Diffuse);

        assert_eq!(triangles[0].positions[0], Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(triangles[0].texture_coords[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_mtl_illum_enables_reflection() {
        let (_, materials) = load_obj_from_buf(&mut QUAD_OBJ.as_bytes(), Some(QUAD_MTL)).unwrap();

        let mirror = materials.iter().find(|m| m.name() == "mirror").unwrap();
        assert_eq!(mirror.kind(), MaterialKind::ReflectDiffuse);
        assert!((mirror.reflect() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_load_obj_without_materials_uses_default() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let (triangles, materials) = load_obj_from_buf(&mut obj.as_bytes(), None).unwrap();

        assert_eq!(triangles.len(), 1);
        assert_eq!(materials.len(), 1);
        assert_eq!(*triangles[0].material, Material::default());
        assert_eq!(triangles[0].texture_coords, [Vec3::ZERO; 3]);
    }

    #[test]
    fn test_load_obj_missing_library_is_error() {
        let err = load_obj_from_buf(&mut QUAD_OBJ.as_bytes(), None).unwrap_err();
        assert!(matches!(err, LoadError::Mtl(_)));
    }
}
