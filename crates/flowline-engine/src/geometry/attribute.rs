use std::fmt;

/// Number of scalar components a custom attribute contributes to every vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeSize {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl AttributeSize {
    #[inline]
    pub const fn get(self) -> usize {
        self as usize
    }

    /// WGSL type of the matching vertex input.
    pub const fn wgsl_type(self) -> &'static str {
        match self {
            AttributeSize::One => "f32",
            AttributeSize::Two => "vec2<f32>",
            AttributeSize::Three => "vec3<f32>",
            AttributeSize::Four => "vec4<f32>",
        }
    }
}

/// Value produced by a custom attribute accessor for one feature.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttributeValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl AttributeValue {
    pub fn components(&self) -> &[f32] {
        match self {
            AttributeValue::Scalar(v) => std::slice::from_ref(v),
            AttributeValue::Vec2(v) => v,
            AttributeValue::Vec3(v) => v,
            AttributeValue::Vec4(v) => v,
        }
    }

    /// Writes exactly `dst.len()` components; missing ones are zero, extra ones are dropped.
    pub fn write_into(&self, dst: &mut [f32]) {
        let src = self.components();
        for (i, slot) in dst.iter_mut().enumerate() {
            *slot = src.get(i).copied().unwrap_or(0.0);
        }
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        AttributeValue::Scalar(v)
    }
}

impl From<[f32; 2]> for AttributeValue {
    fn from(v: [f32; 2]) -> Self {
        AttributeValue::Vec2(v)
    }
}

impl From<[f32; 3]> for AttributeValue {
    fn from(v: [f32; 3]) -> Self {
        AttributeValue::Vec3(v)
    }
}

impl From<[f32; 4]> for AttributeValue {
    fn from(v: [f32; 4]) -> Self {
        AttributeValue::Vec4(v)
    }
}

type ComputeFn<F> = Box<dyn Fn(&F) -> AttributeValue + Send + Sync>;

/// Extra per-vertex data computed from a feature record.
///
/// The accessor runs once per feature while encoding; its result is copied onto
/// every vertex the feature produces. Descriptors are immutable once built.
pub struct CustomAttribute<F> {
    name: String,
    size: AttributeSize,
    compute: ComputeFn<F>,
}

impl<F> CustomAttribute<F> {
    pub fn new<V, C>(name: impl Into<String>, size: AttributeSize, compute: C) -> Self
    where
        F: 'static,
        V: Into<AttributeValue>,
        C: Fn(&F) -> V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            size,
            compute: Box::new(move |feature| compute(feature).into()),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> AttributeSize {
        self.size
    }

    /// Name of the vertex input generated for this attribute (`a_prop_<name>`).
    pub fn vertex_input_name(&self) -> String {
        format!("a_prop_{}", self.name)
    }

    #[inline]
    pub fn compute(&self, feature: &F) -> AttributeValue {
        (self.compute)(feature)
    }
}

impl<F> fmt::Debug for CustomAttribute<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAttribute")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Total scalar count of a descriptor list (Σ size).
pub fn custom_attributes_size<F>(attributes: &[CustomAttribute<F>]) -> usize {
    attributes.iter().map(|a| a.size.get()).sum()
}
