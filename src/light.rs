//! Light sources and the pool of light slots they draw from.
//!
//! A [`LightRegistry`] is shared (through an [`Arc`]) by every [`Light`]
//! of a context. Each light takes a slot when it is created and gives it
//! back when dropped. The slot is the light's index in the `u_lights`
//! uniform array of lighting shaders, or its `GL_LIGHTi` number in the
//! fixed-function pipeline.

use std::{
    cell::OnceCell,
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use glam::{Vec3, Vec4};
use log::{debug, warn};

use crate::{
    device::{legacy, Capabilities, GlDevice},
    shader::Shader,
    types::Color,
};

/// Uniform components kept for the matrices and other non-light uniforms.
const RESERVED_UNIFORM_COMPONENTS: u32 = 64;
/// Uniform components taken by one light in the shader array.
const UNIFORM_COMPONENTS_PER_LIGHT: u32 = 16;

#[derive(Debug, Default)]
struct RegistryState {
    slots: Vec<bool>,
    enabled: BTreeSet<usize>,
    lighting_enabled: bool,
}

/// Slot pool, enabled set and global lighting switch shared by all lights.
#[derive(Debug)]
pub struct LightRegistry {
    state: Mutex<RegistryState>,
}

impl LightRegistry {
    /// A registry with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                slots: vec![false; capacity],
                ..RegistryState::default()
            }),
        }
    }

    /// A registry sized for `caps`: the shader uniform budget when shaders
    /// are available, `GL_MAX_LIGHTS` otherwise.
    #[must_use]
    pub fn for_device(caps: &Capabilities) -> Self {
        let capacity = if caps.shaders {
            Self::shader_capacity(caps.max_vertex_uniform_components)
        } else {
            caps.max_lights as usize
        };
        debug!("light registry with {capacity} slots");
        Self::new(capacity)
    }

    /// How many lights fit in a vertex stage with `uniform_components`
    /// uniform components.
    #[must_use]
    pub fn shader_capacity(uniform_components: u32) -> usize {
        (uniform_components.saturating_sub(RESERVED_UNIFORM_COMPONENTS) / UNIFORM_COMPONENTS_PER_LIGHT) as usize
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<usize> {
        let mut state = self.state();
        let slot = state.slots.iter().position(|used| !used)?;
        state.slots[slot] = true;
        Some(slot)
    }

    fn release(&self, slot: usize) {
        let mut state = self.state();
        if let Some(used) = state.slots.get_mut(slot) {
            *used = false;
        }
        state.enabled.remove(&slot);
    }

    fn set_enabled(&self, slot: usize, enabled: bool) {
        let mut state = self.state();
        if enabled {
            state.enabled.insert(slot);
        } else {
            state.enabled.remove(&slot);
        }
    }

    fn is_enabled(&self, slot: usize) -> bool {
        self.state().enabled.contains(&slot)
    }

    /// Turn lighting as a whole on or off.
    pub fn set_lighting_enabled(&self, enabled: bool) {
        self.state().lighting_enabled = enabled;
    }

    /// Whether lighting as a whole is on.
    #[must_use]
    pub fn is_lighting_enabled(&self) -> bool {
        self.state().lighting_enabled
    }

    /// Slots of the enabled lights, in ascending order.
    #[must_use]
    pub fn enabled_slots(&self) -> Vec<usize> {
        self.state().enabled.iter().copied().collect()
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state().slots.len()
    }

    /// Number of slots held by live lights.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.state().slots.iter().filter(|used| **used).count()
    }

    /// Switch `GL_LIGHTING` to match [`is_lighting_enabled`](Self::is_lighting_enabled).
    pub fn apply_fixed_function<D: GlDevice>(&self, device: &D) {
        if self.is_lighting_enabled() {
            device.enable(legacy::LIGHTING);
        } else {
            device.disable(legacy::LIGHTING);
        }
    }
}

struct UniformNames {
    color: String,
    ambient: String,
    diffuse: String,
    specular: String,
    position: String,
    attenuation: String,
}

impl UniformNames {
    fn new(slot: usize) -> Self {
        let field = |name: &str| format!("u_lights[{slot}].{name}");
        Self {
            color: field("color"),
            ambient: field("ambient"),
            diffuse: field("diffuse"),
            specular: field("specular"),
            position: field("position"),
            attenuation: field("attenuation"),
        }
    }
}

/// A point or directional light.
///
/// Lights created once the registry is full have no slot: they can still
/// be configured, but enabling or uploading them does nothing.
pub struct Light {
    registry: Arc<LightRegistry>,
    slot: Option<usize>,
    position: Vec3,
    directional: bool,
    color: Color,
    ambient: f32,
    diffuse: f32,
    specular: f32,
    attenuation: [f32; 3],
    uniform_names: OnceCell<UniformNames>,
}

impl Light {
    /// A white point light at the origin, disabled, with the first free
    /// slot of `registry`.
    #[must_use]
    pub fn new(registry: Arc<LightRegistry>) -> Self {
        let slot = registry.acquire();
        if slot.is_none() {
            warn!(
                "no free light slot (maximum {}), the light will have no effect",
                registry.capacity()
            );
        }
        Self {
            registry,
            slot,
            position: Vec3::ZERO,
            directional: false,
            color: Color::WHITE,
            ambient: 0.0,
            diffuse: 1.0,
            specular: 1.0,
            attenuation: [1.0, 0.0, 0.0],
            uniform_names: OnceCell::new(),
        }
    }

    /// The slot held by this light.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Position of a point light, or direction of a directional one.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the light to `position`. Directional lights store it as a
    /// normalized direction.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = if self.directional {
            position.normalize_or_zero()
        } else {
            position
        };
    }

    /// Direction of a directional light.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.position
    }

    /// Point a directional light along `direction`.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.set_position(direction);
    }

    /// Move the light by `offset`.
    pub fn move_by(&mut self, offset: Vec3) {
        self.set_position(self.position + offset);
    }

    /// Whether the light shines from infinitely far along a direction.
    #[must_use]
    pub fn is_directional(&self) -> bool {
        self.directional
    }

    /// Make the light directional or positional.
    pub fn set_directional(&mut self, directional: bool) {
        self.directional = directional;
        self.set_position(self.position);
    }

    /// Color of the light.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the color of the light.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Ambient intensity.
    #[must_use]
    pub fn ambient_intensity(&self) -> f32 {
        self.ambient
    }

    /// Set the ambient intensity.
    pub fn set_ambient_intensity(&mut self, intensity: f32) {
        self.ambient = intensity;
    }

    /// Diffuse intensity.
    #[must_use]
    pub fn diffuse_intensity(&self) -> f32 {
        self.diffuse
    }

    /// Set the diffuse intensity.
    pub fn set_diffuse_intensity(&mut self, intensity: f32) {
        self.diffuse = intensity;
    }

    /// Specular intensity.
    #[must_use]
    pub fn specular_intensity(&self) -> f32 {
        self.specular
    }

    /// Set the specular intensity.
    pub fn set_specular_intensity(&mut self, intensity: f32) {
        self.specular = intensity;
    }

    /// `[constant, linear, quadratic]` attenuation coefficients.
    #[must_use]
    pub fn attenuation(&self) -> [f32; 3] {
        self.attenuation
    }

    /// Set the attenuation coefficients.
    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation = [constant, linear, quadratic];
    }

    /// Add the light to the registry's enabled set. No-op without a slot.
    pub fn enable(&self) {
        if let Some(slot) = self.slot {
            self.registry.set_enabled(slot, true);
        }
    }

    /// Remove the light from the registry's enabled set.
    pub fn disable(&self) {
        if let Some(slot) = self.slot {
            self.registry.set_enabled(slot, false);
        }
    }

    /// Whether the light is in the enabled set.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.slot.is_some_and(|slot| self.registry.is_enabled(slot))
    }

    /// Position with `w = 0` for directional lights.
    fn homogeneous_position(&self) -> Vec4 {
        self.position.extend(if self.directional { 0.0 } else { 1.0 })
    }

    fn scaled_color(&self, intensity: f32) -> [f32; 4] {
        let [r, g, b, a] = self.color.to_f32();
        [r * intensity, g * intensity, b * intensity, a]
    }

    /// Upload this light into `u_lights[slot]` of `shader`.
    pub fn add_to_shader<D: GlDevice>(&self, shader: &Shader<D>) {
        let Some(slot) = self.slot else {
            return;
        };
        let names = self.uniform_names.get_or_init(|| UniformNames::new(slot));
        let _block = shader.begin_parameter_block();
        shader.set_color(&names.color, self.color);
        shader.set_float(&names.ambient, self.ambient);
        shader.set_float(&names.diffuse, self.diffuse);
        shader.set_float(&names.specular, self.specular);
        shader.set_vec4(&names.position, self.homogeneous_position());
        shader.set_vec3(&names.attenuation, Vec3::from_array(self.attenuation));
    }

    /// Write this light into `GL_LIGHT0 + slot` and switch it on or off.
    pub fn apply_fixed_function<D: GlDevice>(&self, device: &D) {
        let Some(light) = self.slot.and_then(|slot| u32::try_from(slot).ok()) else {
            return;
        };
        let light = legacy::LIGHT0 + light;
        device.light_fv(light, legacy::POSITION, &self.homogeneous_position().to_array());
        device.light_fv(light, legacy::AMBIENT, &self.scaled_color(self.ambient));
        device.light_fv(light, legacy::DIFFUSE, &self.scaled_color(self.diffuse));
        device.light_fv(light, legacy::SPECULAR, &self.scaled_color(self.specular));
        let [constant, linear, quadratic] = self.attenuation;
        device.light_f(light, legacy::CONSTANT_ATTENUATION, constant);
        device.light_f(light, legacy::LINEAR_ATTENUATION, linear);
        device.light_f(light, legacy::QUADRATIC_ATTENUATION, quadratic);
        if self.is_enabled() {
            device.enable(light);
        } else {
            device.disable(light);
        }
    }
}

/// A copy takes its own slot and starts disabled.
impl Clone for Light {
    fn clone(&self) -> Self {
        let mut light = Self::new(Arc::clone(&self.registry));
        light.position = self.position;
        light.directional = self.directional;
        light.color = self.color;
        light.ambient = self.ambient;
        light.diffuse = self.diffuse;
        light.specular = self.specular;
        light.attenuation = self.attenuation;
        light
    }
}

impl Drop for Light {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.registry.release(slot);
        }
    }
}

impl std::fmt::Debug for Light {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Light")
            .field("slot", &self.slot)
            .field("position", &self.position)
            .field("directional", &self.directional)
            .field("color", &self.color)
            .field("ambient", &self.ambient)
            .field("diffuse", &self.diffuse)
            .field("specular", &self.specular)
            .field("attenuation", &self.attenuation)
            .finish_non_exhaustive()
    }
}
