use std::fmt;

use indexmap::IndexMap;

use crate::{
    ActuatorIndex, ComponentPath, ControllerIndex, Coordinate, CoordinateIndex, Label,
    ModelError, ResolveError,
};

/// The kinds of element a model tree holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Coordinate,
    Actuator,
    Controller,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Coordinate => "coordinate",
            Self::Actuator => "actuator",
            Self::Controller => "controller",
        })
    }
}

/// A typed handle to an element of the model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRef {
    Coordinate(CoordinateIndex),
    Actuator(ActuatorIndex),
    Controller(ControllerIndex),
}

impl ComponentRef {
    #[must_use]
    pub fn kind(self) -> ComponentKind {
        match self {
            Self::Coordinate(_) => ComponentKind::Coordinate,
            Self::Actuator(_) => ComponentKind::Actuator,
            Self::Controller(_) => ComponentKind::Controller,
        }
    }
}

/// The model tree: every registered element, its absolute path, and its index.
///
/// `Topology` is the read-only view handed to actuators and controllers while
/// they connect. It resolves labels in two stages:
///
/// 1. A bare name is looked up within a scope (a controller's own actuators,
///    or the model-wide set of one element kind).
/// 2. An absolute path is looked up across the whole tree.
///
/// Failures distinguish a well-formed label that matched nothing
/// ([`ResolveError::NotFound`]) from one that cannot be used
/// ([`ResolveError::Malformed`], [`ResolveError::Ambiguous`],
/// [`ResolveError::WrongKind`]).
#[derive(Debug, Clone, Default)]
pub struct Topology {
    coordinates: Vec<Coordinate>,
    coordinate_paths: Vec<ComponentPath>,
    actuator_paths: Vec<ComponentPath>,
    controller_paths: Vec<ComponentPath>,
    components: IndexMap<ComponentPath, ComponentRef>,
}

impl Topology {
    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    #[must_use]
    pub fn coordinate(&self, index: CoordinateIndex) -> Option<&Coordinate> {
        self.coordinates.get(index.0)
    }

    #[must_use]
    pub fn coordinate_path(&self, index: CoordinateIndex) -> Option<&ComponentPath> {
        self.coordinate_paths.get(index.0)
    }

    /// Returns the indices of all coordinates in registration order.
    pub fn coordinate_indices(&self) -> impl Iterator<Item = CoordinateIndex> + '_ {
        (0..self.coordinates.len()).map(CoordinateIndex)
    }

    #[must_use]
    pub fn num_actuators(&self) -> usize {
        self.actuator_paths.len()
    }

    #[must_use]
    pub fn actuator_path(&self, index: ActuatorIndex) -> Option<&ComponentPath> {
        self.actuator_paths.get(index.0)
    }

    #[must_use]
    pub fn actuator_name(&self, index: ActuatorIndex) -> Option<&str> {
        self.actuator_path(index).map(ComponentPath::name)
    }

    #[must_use]
    pub fn num_controllers(&self) -> usize {
        self.controller_paths.len()
    }

    #[must_use]
    pub fn controller_path(&self, index: ControllerIndex) -> Option<&ComponentPath> {
        self.controller_paths.get(index.0)
    }

    /// Looks up the element at an absolute path.
    #[must_use]
    pub fn find(&self, path: &ComponentPath) -> Option<ComponentRef> {
        self.components.get(path).copied()
    }

    /// Returns every registered path in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &ComponentPath> + '_ {
        self.components.keys()
    }

    /// Resolves a coordinate by unique name or by absolute path.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the label is malformed, matches nothing,
    /// matches several coordinates by name, or names a non-coordinate path.
    pub fn resolve_coordinate(&self, label: &str) -> Result<CoordinateIndex, ResolveError> {
        match parse_label(label)? {
            Label::Name(name) => unique_by_name(
                ComponentKind::Coordinate,
                &name,
                &self.coordinate_paths,
            )
            .map(CoordinateIndex),
            Label::Path(path) => match self.lookup(&path, ComponentKind::Coordinate)? {
                ComponentRef::Coordinate(index) => Ok(index),
                other => Err(wrong_kind(path, ComponentKind::Coordinate, other)),
            },
        }
    }

    /// Resolves an actuator by model-wide unique name or by absolute path.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the label is malformed, matches nothing,
    /// matches several actuators by name, or names a non-actuator path.
    pub fn resolve_actuator(&self, label: &str) -> Result<ActuatorIndex, ResolveError> {
        match parse_label(label)? {
            Label::Name(name) => {
                unique_by_name(ComponentKind::Actuator, &name, &self.actuator_paths)
                    .map(ActuatorIndex)
            }
            Label::Path(path) => self.actuator_at(path),
        }
    }

    /// Resolves an actuator against a controller's scope first, then the tree.
    ///
    /// Stage one returns the first actuator in `scope` whose name or absolute
    /// path equals `label`.
    /// Stage two, reached only for absolute paths, resolves the path across
    /// the whole tree.
    /// A bare name that is not in `scope` is [`ResolveError::NotFound`], even
    /// if the model holds an actuator of that name elsewhere.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if neither stage yields an actuator.
    pub fn resolve_actuator_in(
        &self,
        label: &str,
        scope: &[ActuatorIndex],
    ) -> Result<ActuatorIndex, ResolveError> {
        let parsed = parse_label(label)?;

        let in_scope = scope.iter().copied().find(|index| {
            self.actuator_path(*index).is_some_and(|path| match &parsed {
                Label::Name(name) => path.name() == name,
                Label::Path(_) => path.matches(label),
            })
        });
        if let Some(index) = in_scope {
            return Ok(index);
        }

        match parsed {
            Label::Name(name) => Err(ResolveError::NotFound {
                kind: ComponentKind::Actuator,
                label: name,
            }),
            Label::Path(path) => self.actuator_at(path),
        }
    }

    /// Resolves a controller by model-wide unique name or by absolute path.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the label does not identify exactly one controller.
    pub fn resolve_controller(&self, label: &str) -> Result<ControllerIndex, ResolveError> {
        match parse_label(label)? {
            Label::Name(name) => {
                unique_by_name(ComponentKind::Controller, &name, &self.controller_paths)
                    .map(ControllerIndex)
            }
            Label::Path(path) => match self.lookup(&path, ComponentKind::Controller)? {
                ComponentRef::Controller(index) => Ok(index),
                other => Err(wrong_kind(path, ComponentKind::Controller, other)),
            },
        }
    }

    pub(crate) fn insert_coordinate(
        &mut self,
        path: ComponentPath,
        coordinate: Coordinate,
    ) -> Result<CoordinateIndex, ModelError> {
        let index = CoordinateIndex(self.coordinates.len());
        self.claim(path.clone(), ComponentRef::Coordinate(index))?;
        self.coordinates.push(coordinate);
        self.coordinate_paths.push(path);
        Ok(index)
    }

    pub(crate) fn insert_actuator(
        &mut self,
        path: ComponentPath,
    ) -> Result<ActuatorIndex, ModelError> {
        let index = ActuatorIndex(self.actuator_paths.len());
        self.claim(path.clone(), ComponentRef::Actuator(index))?;
        self.actuator_paths.push(path);
        Ok(index)
    }

    pub(crate) fn insert_controller(
        &mut self,
        path: ComponentPath,
    ) -> Result<ControllerIndex, ModelError> {
        let index = ControllerIndex(self.controller_paths.len());
        self.claim(path.clone(), ComponentRef::Controller(index))?;
        self.controller_paths.push(path);
        Ok(index)
    }

    pub(crate) fn remove_actuator(&mut self, index: ActuatorIndex) {
        if index.0 < self.actuator_paths.len() {
            self.actuator_paths.remove(index.0);
            self.reindex();
        }
    }

    pub(crate) fn remove_controller(&mut self, index: ControllerIndex) {
        if index.0 < self.controller_paths.len() {
            self.controller_paths.remove(index.0);
            self.reindex();
        }
    }

    pub(crate) fn clear_actuators(&mut self) {
        self.actuator_paths.clear();
        self.reindex();
    }

    fn claim(&mut self, path: ComponentPath, component: ComponentRef) -> Result<(), ModelError> {
        if self.components.contains_key(&path) {
            return Err(ModelError::DuplicatePath { path });
        }
        self.components.insert(path, component);
        Ok(())
    }

    /// Rebuilds the path map after indices shift.
    fn reindex(&mut self) {
        let coordinates = self
            .coordinate_paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path.clone(), ComponentRef::Coordinate(CoordinateIndex(i))));
        let actuators = self
            .actuator_paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path.clone(), ComponentRef::Actuator(ActuatorIndex(i))));
        let controllers = self
            .controller_paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path.clone(), ComponentRef::Controller(ControllerIndex(i))));

        self.components = coordinates.chain(actuators).chain(controllers).collect();
    }

    fn lookup(
        &self,
        path: &ComponentPath,
        expected: ComponentKind,
    ) -> Result<ComponentRef, ResolveError> {
        self.find(path).ok_or_else(|| ResolveError::NotFound {
            kind: expected,
            label: path.to_string(),
        })
    }

    fn actuator_at(&self, path: ComponentPath) -> Result<ActuatorIndex, ResolveError> {
        match self.lookup(&path, ComponentKind::Actuator)? {
            ComponentRef::Actuator(index) => Ok(index),
            other => Err(wrong_kind(path, ComponentKind::Actuator, other)),
        }
    }
}

fn parse_label(label: &str) -> Result<Label, ResolveError> {
    Label::parse(label).map_err(|source| ResolveError::Malformed {
        label: label.to_owned(),
        source,
    })
}

fn unique_by_name(
    kind: ComponentKind,
    name: &str,
    paths: &[ComponentPath],
) -> Result<usize, ResolveError> {
    let mut matches = paths
        .iter()
        .enumerate()
        .filter(|(_, path)| path.name() == name);

    match (matches.next(), matches.next()) {
        (None, _) => Err(ResolveError::NotFound {
            kind,
            label: name.to_owned(),
        }),
        (Some((index, _)), None) => Ok(index),
        (Some(_), Some(_)) => Err(ResolveError::Ambiguous {
            kind,
            label: name.to_owned(),
            matches: paths
                .iter()
                .filter(|path| path.name() == name)
                .cloned()
                .collect(),
        }),
    }
}

fn wrong_kind(path: ComponentPath, expected: ComponentKind, found: ComponentRef) -> ResolveError {
    ResolveError::WrongKind {
        path,
        expected,
        found: found.kind(),
    }
}
