//! Scene objects: a mesh, its textures, and a transform.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glimt_core::material::load_mtl;
use glimt_core::math::{self, Mat4, Vec3};
use glimt_core::mesh::{load_obj, CpuMesh};
use glimt_core::CpuTexture;

use crate::backend::Backend;
use crate::error::GraphicsError;
use crate::pipeline::{FillMode, PipelineDesc, PipelineState, ShaderSet};
use crate::resource::GpuResource;
use crate::texture::TextureSet;
use crate::types::{BufferDescriptor, BufferUsage};

/// How to build a scene object.
#[derive(Debug, Clone)]
pub struct ObjectDesc {
    pub mesh_path: PathBuf,
    pub label: String,
    pub position: Vec3,
    pub scale: Vec3,
    pub wireframe: bool,
}

impl ObjectDesc {
    pub fn new(mesh_path: impl Into<PathBuf>) -> Self {
        let mesh_path = mesh_path.into();
        let label = mesh_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string());
        Self {
            mesh_path,
            label,
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            wireframe: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// A drawable object with its GPU resources and transform state.
///
/// The world matrix composes in row-vector order, scale first:
/// `world = S * R * T`. The uploaded matrix is `world * view * projection`
/// transposed so the shader reads it column-major.
pub struct SceneObject {
    label: String,
    position: Vec3,
    scale: Vec3,
    rotation: Mat4,
    wvp: [f32; 16],
    positions_buffer: GpuResource,
    uv_buffer: GpuResource,
    constant_buffer: GpuResource,
    vertex_count: u32,
    texture_set: TextureSet,
    pipeline: PipelineState,
}

impl SceneObject {
    /// Load an object from an OBJ file.
    ///
    /// The material library and every texture it names are resolved
    /// relative to the OBJ's directory. A missing material library or an
    /// undecodable texture is reported and skipped; an object that ends
    /// up with no textures at all samples a white placeholder instead.
    pub fn load(
        backend: &Arc<dyn Backend>,
        desc: &ObjectDesc,
        shaders: &ShaderSet,
    ) -> Result<Self, GraphicsError> {
        let mesh = load_obj(&desc.mesh_path)?;
        let base_dir = desc
            .mesh_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut textures = Vec::new();
        if let Some(lib) = &mesh.material_lib {
            let mtl_path = base_dir.join(lib);
            match load_mtl(&mtl_path) {
                Ok(material) => {
                    for file in &material.texture_files {
                        let path = base_dir.join(file);
                        match CpuTexture::load(&path) {
                            Ok(pixels) => textures.push(pixels),
                            Err(err) => {
                                log::warn!("'{}': skipping texture: {err}", desc.label);
                            }
                        }
                    }
                }
                Err(err) => {
                    log::warn!("'{}': no material library: {err}", desc.label);
                }
            }
        }
        if textures.is_empty() {
            log::warn!("'{}' has no usable textures, using placeholder", desc.label);
            textures.push(CpuTexture::white_placeholder());
        }

        Self::from_parts(backend, &mesh, &textures, shaders, desc)
    }

    /// Build an object from already-loaded mesh and texture data.
    pub fn from_parts(
        backend: &Arc<dyn Backend>,
        mesh: &CpuMesh,
        textures: &[CpuTexture],
        shaders: &ShaderSet,
        desc: &ObjectDesc,
    ) -> Result<Self, GraphicsError> {
        let positions_bytes: &[u8] = bytemuck::cast_slice(&mesh.positions);
        let positions_buffer = GpuResource::new_buffer(
            backend,
            &BufferDescriptor::upload(positions_bytes.len() as u64, BufferUsage::SHADER_RESOURCE)
                .with_label(format!("{} positions", desc.label)),
        )?;
        positions_buffer.write(0, positions_bytes)?;

        let uv_bytes: &[u8] = bytemuck::cast_slice(&mesh.uvs);
        let uv_buffer = GpuResource::new_buffer(
            backend,
            &BufferDescriptor::upload(uv_bytes.len() as u64, BufferUsage::SHADER_RESOURCE)
                .with_label(format!("{} uvs", desc.label)),
        )?;
        uv_buffer.write(0, uv_bytes)?;

        let constant_buffer = GpuResource::new_buffer(
            backend,
            &BufferDescriptor::upload(
                crate::frame::align_constant_buffer_size(16 * 4),
                BufferUsage::CONSTANT,
            )
            .with_label(format!("{} constants", desc.label)),
        )?;

        let texture_set = TextureSet::new(backend, textures, &desc.label)?;

        let fill_mode = if desc.wireframe {
            FillMode::Wireframe
        } else {
            FillMode::Solid
        };
        let pipeline = PipelineState::new(
            PipelineDesc::standard(shaders, fill_mode).with_label(desc.label.clone()),
        );

        let mut object = Self {
            label: desc.label.clone(),
            position: desc.position,
            scale: desc.scale,
            rotation: Mat4::identity(),
            wvp: [0.0; 16],
            positions_buffer,
            uv_buffer,
            constant_buffer,
            vertex_count: mesh.vertex_count() as u32,
            texture_set,
            pipeline,
        };
        object.update_transform(&Mat4::identity())?;
        Ok(object)
    }

    /// Recompute the WVP matrix and rewrite the object's constants.
    pub fn update_transform(&mut self, view_projection: &Mat4) -> Result<(), GraphicsError> {
        let world =
            math::scaling(self.scale) * self.rotation * math::translation(self.position);
        let wvp = (world * view_projection).transpose();
        self.wvp = math::to_row_major_array(&wvp);
        self.constant_buffer
            .write(0, bytemuck::cast_slice(&self.wvp))
    }

    /// Compose additional rotation onto the object, radians per axis.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) {
        self.rotation =
            self.rotation * math::rotation_x(x) * math::rotation_y(y) * math::rotation_z(z);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Latest WVP matrix as raw root-constant words.
    pub fn wvp_bits(&self) -> [u32; 16] {
        self.wvp.map(f32::to_bits)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    #[inline]
    pub fn positions_buffer(&self) -> &GpuResource {
        &self.positions_buffer
    }

    #[inline]
    pub fn uv_buffer(&self) -> &GpuResource {
        &self.uv_buffer
    }

    #[inline]
    pub fn texture_set(&self) -> &TextureSet {
        &self.texture_set
    }

    #[inline]
    pub fn texture_set_mut(&mut self) -> &mut TextureSet {
        &mut self.texture_set
    }
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("label", &self.label)
            .field("vertices", &self.vertex_count)
            .field("textures", &self.texture_set.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::ShaderBytecode;
    use glimt_core::mesh::parse_obj;

    fn shaders() -> ShaderSet {
        ShaderSet {
            vertex: ShaderBytecode::new(vec![0xC0], "vs_main"),
            pixel: ShaderBytecode::new(vec![0xC1], "ps_main"),
        }
    }

    fn triangle() -> CpuMesh {
        parse_obj(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1/1/1 2/2/2 3/3/3\n",
            "triangle.obj",
        )
    }

    #[test]
    fn constants_hold_the_transposed_wvp() {
        let headless = Arc::new(HeadlessBackend::new());
        let backend: Arc<dyn Backend> = headless.clone();
        let desc = ObjectDesc::new("triangle.obj")
            .with_position(Vec3::new(2.0, 0.0, 0.0))
            .with_scale(Vec3::new(3.0, 3.0, 3.0));
        let mut object = SceneObject::from_parts(
            &backend,
            &triangle(),
            &[CpuTexture::white_placeholder()],
            &shaders(),
            &desc,
        )
        .unwrap();

        object.update_transform(&Mat4::identity()).unwrap();
        let expected = math::to_row_major_array(
            &(math::scaling(desc.scale) * math::translation(desc.position)).transpose(),
        );
        assert_eq!(object.wvp_bits(), expected.map(f32::to_bits));
    }

    #[test]
    fn vertex_count_comes_from_the_mesh() {
        let headless = Arc::new(HeadlessBackend::new());
        let backend: Arc<dyn Backend> = headless;
        let object = SceneObject::from_parts(
            &backend,
            &triangle(),
            &[CpuTexture::white_placeholder()],
            &shaders(),
            &ObjectDesc::new("triangle.obj"),
        )
        .unwrap();
        assert_eq!(object.vertex_count(), 3);
    }

    #[test]
    fn missing_mesh_file_is_an_asset_error() {
        let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::new());
        let err = SceneObject::load(
            &backend,
            &ObjectDesc::new("/nonexistent/mesh.obj"),
            &shaders(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphicsError::AssetLoad(_)));
    }
}
