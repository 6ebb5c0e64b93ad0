// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Kinematic systems: parent-ordered links with resolved joint capabilities.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::joint::{JointError, JointParams, JointRegistry, JointSpec, JointType};
use crate::math::{MathError, Vec3};
use crate::transform::Transform;

/// Errors raised while building or editing a [`System`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SystemError {
    /// A link used a joint type missing from the registry.
    #[error(transparent)]
    Joint(#[from] JointError),
    /// A parent name did not match any link.
    #[error("link `{link}` names unknown parent `{parent}`")]
    UnknownParent {
        /// Child link.
        link: String,
        /// Missing parent name.
        parent: String,
    },
    /// A parent appeared at or after its child.
    #[error("link `{link}` (index {index}) has parent index {parent}; parents must come first")]
    ParentOrder {
        /// Child link.
        link: String,
        /// Child index.
        index: usize,
        /// Parent index.
        parent: usize,
    },
    /// Two links share a name.
    #[error("duplicate link name `{0}`")]
    DuplicateName(String),
    /// A link name or index did not resolve.
    #[error("unknown link `{0}`")]
    UnknownLink(String),
    /// The timestep was not a positive finite number.
    #[error("timestep must be > 0, got {0}")]
    InvalidTimestep(f32),
    /// A static transform or parameter was not finite.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// One link of a system, with its joint capabilities already resolved.
#[derive(Debug, Clone)]
pub struct Link {
    /// Unique name.
    pub name: String,
    /// Parent index; `None` attaches the link to the world frame.
    pub parent: Option<usize>,
    /// Joint-type tag.
    pub joint: JointType,
    /// Capability record resolved from the registry at build time.
    pub spec: JointSpec,
    /// Joint-specific static parameters.
    pub params: JointParams,
    /// Static offset from the parent frame to the joint frame.
    pub transform: Transform,
    /// Optional box `(min, max)` for randomizing the static offset position.
    pub pos_bounds: Option<(Vec3, Vec3)>,
}

/// Read-only, parent-ordered tree (or forest) of links.
///
/// Edits produce new values ([`System::with_link_transform`]); a `System`
/// shared between concurrent draws is never mutated in place.
#[derive(Debug, Clone)]
pub struct System {
    links: Vec<Link>,
    gravity: Vec3,
    dt: f32,
}

impl System {
    /// Number of links.
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// All links in index order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Link at `index`.
    pub fn link(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// Parent indices in link order.
    pub fn parents(&self) -> Vec<Option<usize>> {
        self.links.iter().map(|l| l.parent).collect()
    }

    /// Joint tags in link order.
    pub fn link_types(&self) -> Vec<JointType> {
        self.links.iter().map(|l| l.joint).collect()
    }

    /// Link names in link order.
    pub fn link_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }

    /// Coordinate width of every link.
    pub fn dofs(&self) -> Vec<usize> {
        self.links.iter().map(|l| l.spec.dof).collect()
    }

    /// Sum of all coordinate widths.
    pub fn total_dof(&self) -> usize {
        self.links.iter().map(|l| l.spec.dof).sum()
    }

    /// Column offset of each link's block inside `q`.
    pub fn q_offsets(&self) -> Vec<usize> {
        self.links
            .iter()
            .scan(0, |acc, l| {
                let start = *acc;
                *acc += l.spec.dof;
                Some(start)
            })
            .collect()
    }

    /// Index of the link called `name`.
    pub fn name_to_idx(&self, name: &str) -> Result<usize, SystemError> {
        self.links
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| SystemError::UnknownLink(name.to_owned()))
    }

    /// Gravity vector.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Copy of the system with link `index`'s static offset replaced.
    pub fn with_link_transform(
        &self,
        index: usize,
        transform: Transform,
    ) -> Result<Self, SystemError> {
        let mut links = self.links.clone();
        let link = links
            .get_mut(index)
            .ok_or_else(|| SystemError::UnknownLink(index.to_string()))?;
        link.transform = transform;
        Ok(Self {
            links,
            gravity: self.gravity,
            dt: self.dt,
        })
    }

    /// Copy of the system with every static offset replaced by `f(index, link)`.
    pub fn map_link_transforms<F>(&self, mut f: F) -> Result<Self, SystemError>
    where
        F: FnMut(usize, &Link) -> Result<Transform, SystemError>,
    {
        let mut links = self.links.clone();
        for (i, link) in links.iter_mut().enumerate() {
            link.transform = f(i, &self.links[i])?;
        }
        Ok(Self {
            links,
            gravity: self.gravity,
            dt: self.dt,
        })
    }

    /// Copy of the system with every link's joint parameters replaced by
    /// `f(index, link)`.
    pub fn map_link_params<F>(&self, mut f: F) -> Result<Self, SystemError>
    where
        F: FnMut(usize, &Link) -> Result<JointParams, SystemError>,
    {
        let mut links = self.links.clone();
        for (i, link) in links.iter_mut().enumerate() {
            link.params = f(i, &self.links[i])?;
        }
        Ok(Self {
            links,
            gravity: self.gravity,
            dt: self.dt,
        })
    }
}

/// Declarative description of one link, consumed by [`SystemBuilder`].
#[derive(Debug, Clone)]
pub struct LinkDef {
    name: String,
    parent: Option<String>,
    joint: JointType,
    params: JointParams,
    transform: Transform,
    pos_bounds: Option<(Vec3, Vec3)>,
}

impl LinkDef {
    /// Root link with identity offset and default parameters.
    pub fn new(name: impl Into<String>, joint: JointType) -> Self {
        Self {
            name: name.into(),
            parent: None,
            joint,
            params: JointParams::default(),
            transform: Transform::identity(),
            pos_bounds: None,
        }
    }

    /// Attaches the link to `parent`.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Static offset from the parent frame.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Axis for `rr`/`pr` joints.
    pub fn axis(mut self, axis: Vec3) -> Self {
        self.params.axis = axis;
        self
    }

    /// Box used by position randomization.
    pub fn pos_bounds(mut self, min: Vec3, max: Vec3) -> Self {
        self.pos_bounds = Some((min, max));
        self
    }
}

/// Builds a [`System`] against a joint registry.
///
/// Stands in for an external loader: it validates ordering and resolves each
/// joint tag once so the rest of the pipeline never consults the registry.
#[derive(Debug)]
pub struct SystemBuilder<'r> {
    registry: &'r JointRegistry,
    links: Vec<LinkDef>,
    gravity: Vec3,
    dt: f32,
}

impl<'r> SystemBuilder<'r> {
    /// Empty builder with gravity `-9.81 ẑ` and `dt = 0.01`.
    pub fn new(registry: &'r JointRegistry) -> Self {
        Self {
            registry,
            links: Vec::new(),
            gravity: Vec3::new(0.0, 0.0, -9.81),
            dt: 0.01,
        }
    }

    /// Appends a link; links must be added parents first.
    pub fn link(mut self, def: LinkDef) -> Self {
        self.links.push(def);
        self
    }

    /// Overrides gravity.
    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Overrides the timestep.
    pub fn dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Validates and resolves the system.
    pub fn build(self) -> Result<System, SystemError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SystemError::InvalidTimestep(self.dt));
        }
        if !self.gravity.is_finite() {
            return Err(MathError::NonFiniteVector(self.gravity.to_array()).into());
        }

        let mut index_of: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, def) in self.links.iter().enumerate() {
            if index_of.insert(def.name.as_str(), i).is_some() {
                return Err(SystemError::DuplicateName(def.name.clone()));
            }
        }

        let mut links = Vec::with_capacity(self.links.len());
        for (index, def) in self.links.iter().enumerate() {
            let parent = match &def.parent {
                None => None,
                Some(name) => {
                    let p = *index_of.get(name.as_str()).ok_or_else(|| {
                        SystemError::UnknownParent {
                            link: def.name.clone(),
                            parent: name.clone(),
                        }
                    })?;
                    if p >= index {
                        return Err(SystemError::ParentOrder {
                            link: def.name.clone(),
                            index,
                            parent: p,
                        });
                    }
                    Some(p)
                }
            };
            if !def.params.axis.is_finite() {
                return Err(MathError::NonFiniteVector(def.params.axis.to_array()).into());
            }
            let spec = self.registry.resolve(def.joint)?;
            links.push(Link {
                name: def.name.clone(),
                parent,
                joint: def.joint,
                spec,
                params: def.params,
                transform: def.transform,
                pos_bounds: def.pos_bounds,
            });
        }

        Ok(System {
            links,
            gravity: self.gravity,
            dt: self.dt,
        })
    }
}
