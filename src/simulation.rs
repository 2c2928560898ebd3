use crate::config::SimulationConfig;
use crate::consistency::{ParallelSimulation, SimulationConsistency};
use crate::context::RunContext;
use crate::element::{
    compute_fcw, Element, ElementEvent, ElementKind, FcwMetrics, Obstacle, Pedestrian, SignalLight,
    SysId, Vehicle,
};
use crate::error::{Error, InitError};
use crate::math::{OrientedBox, Wgs84};
use crate::output::OutputBatch;
use crate::road::RoadNetwork;
use crate::scene::{
    Catalog, ObstacleAttributes, PedestrianAttributes, SignalAttributes, VehicleAttributes,
};
use crate::signal::SignalColor;
use crate::spatial::{HashedLaneRegistry, PolygonIndex};
use crate::time::TimeContext;
use crate::{ElementId, ElementSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A traffic simulation.
pub struct Simulation {
    /// Configuration, local frame, road network and hashed lane index.
    ctx: RunContext,
    /// Object type dimensions.
    catalog: Catalog,
    /// The elements being simulated, including those not yet started. Ended
    /// elements are destroyed at the next tick.
    elements: ElementSet,
    /// Elements by their system id.
    by_sys_id: HashMap<SysId, ElementId>,
    /// Footprints of the visible elements as of the end of the last tick.
    polygons: PolygonIndex,
    /// The element forward-collision metrics are computed against.
    fcw_reference: Option<ElementId>,
    /// The timestamps of the last tick.
    time: TimeContext,
    /// The colour each signal-controlled lane-link showed at the end of the last tick.
    signal_states: HashMap<u64, SignalColor>,
    /// The output of the last tick.
    output: OutputBatch,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation on a road network, with `origin` as the origin of the local frame.
    pub fn new(config: SimulationConfig, origin: Wgs84, road: Arc<dyn RoadNetwork>) -> Self {
        Self {
            ctx: RunContext::new(config, origin, road),
            catalog: Catalog::default(),
            elements: ElementSet::default(),
            by_sys_id: HashMap::new(),
            polygons: PolygonIndex::new(),
            fcw_reference: None,
            time: TimeContext::default(),
            signal_states: HashMap::new(),
            output: OutputBatch::default(),
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Replaces the catalog of object types.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.ctx.config
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Adds a vehicle to the simulation.
    pub fn add_vehicle(&mut self, attrs: &VehicleAttributes) -> Result<ElementId, Error> {
        self.insert(ElementKind::Vehicle, attrs.id, |id, ctx, catalog| {
            Vehicle::new(id, attrs, ctx, catalog).map(Element::Vehicle)
        })
    }

    /// Adds a pedestrian to the simulation.
    pub fn add_pedestrian(&mut self, attrs: &PedestrianAttributes) -> Result<ElementId, Error> {
        self.insert(ElementKind::Pedestrian, attrs.id, |id, ctx, catalog| {
            Pedestrian::new(id, attrs, ctx, catalog).map(Element::Pedestrian)
        })
    }

    /// Adds a static obstacle to the simulation.
    pub fn add_obstacle(&mut self, attrs: &ObstacleAttributes) -> Result<ElementId, Error> {
        self.insert(ElementKind::Obstacle, attrs.id, |id, ctx, catalog| {
            Obstacle::new(id, attrs, ctx, catalog).map(Element::Obstacle)
        })
    }

    /// Adds a signal light to the simulation.
    pub fn add_signal(&mut self, attrs: &SignalAttributes) -> Result<ElementId, Error> {
        self.insert(ElementKind::SignalLight, attrs.id, |id, ctx, _| {
            SignalLight::new(id, attrs, ctx).map(Element::SignalLight)
        })
    }

    /// Creates an element and files it in the indices. An ended element with
    /// the same id is replaced.
    fn insert(
        &mut self,
        kind: ElementKind,
        user_id: i64,
        build: impl FnOnce(ElementId, &RunContext, &Catalog) -> Result<Element, InitError>,
    ) -> Result<ElementId, Error> {
        let sys_id = SysId::new(kind, user_id);
        if let Some(old) = self.by_sys_id.get(&sys_id).copied() {
            match self.elements.get(old) {
                Some(el) if !el.base().life().is_ended() => {
                    return Err(Error::DuplicateId(sys_id));
                }
                _ => {
                    self.elements.remove(old);
                }
            }
        }

        let (ctx, catalog) = (&self.ctx, &self.catalog);
        let id = self
            .elements
            .try_insert_with_key(|id| build(id, ctx, catalog))
            .map_err(|source| {
                log::warn!("failed to add {sys_id}: {source}");
                Error::Init {
                    id: user_id,
                    source,
                }
            })?;
        self.by_sys_id.insert(sys_id, id);

        let element = &mut self.elements[id];
        element.check_lifecycle(&self.ctx, self.time.abs_time);
        if let Some(poly) = element.visible_polygon() {
            self.polygons.insert(id, &poly.vertices());
        }
        Ok(id)
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, Error> {
        self.elements.get_mut(id).ok_or(Error::UnknownElement(id))
    }

    /// Ends an element immediately.
    pub fn kill(&mut self, id: ElementId) -> Result<(), Error> {
        let ctx = &self.ctx;
        let element = self.elements.get_mut(id).ok_or(Error::UnknownElement(id))?;
        element.kill(ctx);
        self.polygons.remove(id);
        Ok(())
    }

    /// Stops an element where it is. Elements set to terminate on stop, and
    /// injected elements, end instead.
    pub fn stop(&mut self, id: ElementId) -> Result<(), Error> {
        let ctx = &self.ctx;
        let element = self.elements.get_mut(id).ok_or(Error::UnknownElement(id))?;
        element.stop(ctx);
        if element.base().life().is_ended() {
            self.polygons.remove(id);
        }
        Ok(())
    }

    /// Sends an external command to an element. Returns false if the element ignores it.
    pub fn handle_event(&mut self, id: ElementId, event: ElementEvent) -> Result<bool, Error> {
        Ok(self.element_mut(id)?.handle_event(event))
    }

    /// Sets the element forward-collision metrics are computed against, or clears it.
    pub fn set_fcw_reference(&mut self, id: Option<ElementId>) -> Result<(), Error> {
        if let Some(id) = id {
            if !self.elements.contains_key(id) {
                return Err(Error::UnknownElement(id));
            }
        }
        self.fcw_reference = id;
        Ok(())
    }

    fn replicated_signal(&mut self, signal_id: i64) -> Result<&mut SignalLight, Error> {
        let id = self
            .find(ElementKind::SignalLight, signal_id)
            .ok_or(Error::UnknownSignal(signal_id))?;
        let signal = self
            .elements
            .get_mut(id)
            .and_then(Element::as_signal_light_mut)
            .ok_or(Error::UnknownSignal(signal_id))?;
        if !signal.is_replicated() {
            return Err(Error::NotReplicated(signal_id));
        }
        Ok(signal)
    }

    /// Re-derives the lanes and lane-links a replicated signal controls from the road topology.
    pub fn initialize_parallel_simulation(&mut self, signal_id: i64) -> Result<(), Error> {
        let road = self.ctx.road.clone();
        self.replicated_signal(signal_id)?
            .initialize_parallel_simulation(road.as_ref())
            .map_err(|source| Error::Init {
                id: signal_id,
                source,
            })
    }

    /// Pushes the authoritative colour of a replicated signal, shown from the next tick.
    pub fn update_parallel_simulation(
        &mut self,
        signal_id: i64,
        color: SignalColor,
    ) -> Result<(), Error> {
        self.replicated_signal(signal_id)?
            .update_parallel_simulation(color);
        Ok(())
    }

    /// Randomly assigns a desired velocity adjustment factor to each vehicle,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`.
    pub fn randomise_desired_velocities(&mut self, stddev: f64) -> Result<(), Error> {
        let mut rand = StdRng::seed_from_u64(self.ctx.config.random_seed);
        let distr =
            rand_distr::Normal::new(1.0, stddev).map_err(|_| Error::InvalidDeviation(stddev))?;
        for element in self.elements.values_mut() {
            if let Element::Vehicle(vehicle) = element {
                let factor = distr.sample(&mut rand).clamp(0.75, 1.25);
                vehicle.set_velocity_adjust(factor);
            }
        }
        Ok(())
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) -> &OutputBatch {
        let time = self.time.next(dt);
        self.update(time)
    }

    /// Advances the simulation to the timestamps announced by the master clock.
    ///
    /// Each tick runs as a sequence of passes. Elements first plan from the
    /// stable state of others, then update their own live state, then save it
    /// as their new stable state. Derived state and output are computed last.
    pub fn update(&mut self, time: TimeContext) -> &OutputBatch {
        self.time = time;
        self.check_lifecycles();
        self.plan_vehicles();
        self.update_elements();
        self.drop_ended();
        self.save_stable_states();
        self.rebuild_polygons();
        self.refresh_signal_states();
        self.compute_fcw();
        self.write_output();

        #[cfg(feature = "debug")]
        {
            self.debug = self.ctx.debug.take();
        }
        &self.output
    }

    fn check_lifecycles(&mut self) {
        let ctx = &self.ctx;
        let abs_time = self.time.abs_time;
        for element in self.elements.values_mut() {
            element.check_lifecycle(ctx, abs_time);
        }
    }

    /// Computes the accelerations of the running vehicles. Read only.
    fn plan_vehicles(&mut self) {
        let (ctx, elements, signals) = (&self.ctx, &self.elements, &self.signal_states);
        let plans = elements
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|(id, element)| {
                let vehicle = element.as_vehicle()?;
                if !element.base().life().is_running() {
                    return None;
                }
                Some((id, vehicle.plan(ctx, elements, signals)))
            })
            .collect::<Vec<_>>();
        for (id, acc) in plans {
            if let Some(Element::Vehicle(vehicle)) = self.elements.get_mut(id) {
                vehicle.set_planned_acc(acc);
            }
        }
    }

    fn update_elements(&mut self) {
        let (ctx, time) = (&self.ctx, &self.time);
        self.elements
            .values_mut()
            .filter(|element| element.base().life().is_running())
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(|element| element.update(ctx, time));
    }

    /// Destroys the elements that ended during this tick or since the last one.
    fn drop_ended(&mut self) {
        let ended = self
            .elements
            .iter()
            .filter(|(_, element)| element.base().life().is_ended())
            .map(|(id, element)| (id, element.sys_id()))
            .collect::<Vec<_>>();
        for (id, sys_id) in ended {
            self.elements.remove(id);
            self.polygons.remove(id);
            if self.by_sys_id.get(&sys_id) == Some(&id) {
                self.by_sys_id.remove(&sys_id);
            }
            if self.fcw_reference == Some(id) {
                self.fcw_reference = None;
            }
            log::debug!("{sys_id} destroyed");
        }
    }

    fn save_stable_states(&mut self) {
        self.elements
            .values_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(|element| element.save_stable_state());
    }

    fn rebuild_polygons(&mut self) {
        #[cfg(feature = "debug")]
        let debug = &self.ctx.debug;
        self.polygons = PolygonIndex::bulk_load(self.elements.iter().filter_map(|(id, element)| {
            let poly = element.visible_polygon()?;
            #[cfg(feature = "debug")]
            debug.polygon(&element.sys_id().to_string(), poly);
            Some((id, poly.vertices()))
        }));
    }

    /// Collects the colour of every signal-controlled lane-link. Where several
    /// signals control one lane-link, the most restrictive colour wins.
    fn refresh_signal_states(&mut self) {
        fn severity(color: SignalColor) -> u8 {
            match color {
                SignalColor::Red => 2,
                SignalColor::Yellow => 1,
                SignalColor::Green | SignalColor::Grey => 0,
            }
        }
        self.signal_states.clear();
        let signals = self
            .elements
            .values()
            .filter(|element| element.base().life().is_alive())
            .filter_map(Element::as_signal_light);
        for signal in signals {
            let color = signal.color().effective();
            for link in signal.control_links() {
                self.signal_states
                    .entry(link.id)
                    .and_modify(|c| {
                        if severity(color) > severity(*c) {
                            *c = color;
                        }
                    })
                    .or_insert(color);
            }
        }
    }

    /// Computes every vehicle's forward-collision metrics against the reference. Read only.
    fn compute_fcw(&mut self) {
        let reference = self
            .fcw_reference
            .and_then(|id| self.elements.get(id))
            .filter(|element| element.base().life().is_alive());
        let (ctx, elements) = (&self.ctx, &self.elements);
        let metrics: Vec<(ElementId, Option<FcwMetrics>)> = elements
            .iter()
            .filter(|(_, element)| element.kind() == ElementKind::Vehicle)
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(id, vehicle)| {
                let metrics = reference
                    .filter(|reference| reference.id() != id)
                    .map(|reference| {
                        compute_fcw(reference, vehicle, ctx.config.fcw_radius, &ctx.geo)
                    });
                (id, metrics)
            })
            .collect();
        for (id, fcw) in metrics {
            if let Some(Element::Vehicle(vehicle)) = self.elements.get_mut(id) {
                vehicle.set_fcw(fcw);
            }
        }
    }

    fn write_output(&mut self) {
        let ctx = &self.ctx;
        let mut batch = OutputBatch::new(self.time.frame, self.time.abs_time);
        let outputs = self
            .elements
            .values()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|element| element.output(ctx))
            .collect::<Vec<_>>();
        for output in outputs {
            batch.push(output);
        }
        batch.sort();
        self.output = batch;
    }

    /// The output of the last tick.
    pub fn output(&self) -> &OutputBatch {
        &self.output
    }

    /// The timestamps of the last tick.
    pub fn time(&self) -> TimeContext {
        self.time
    }

    /// Gets a reference to the element with the given ID.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// The element of the given kind with the given user id.
    pub fn find(&self, kind: ElementKind, user_id: i64) -> Option<ElementId> {
        self.by_sys_id.get(&SysId::new(kind, user_id)).copied()
    }

    /// Returns an iterator over all the elements in the simulation.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter()
    }

    /// The R-tree of element footprints.
    pub fn polygons(&self) -> &PolygonIndex {
        &self.polygons
    }

    /// The hashed lane index.
    pub fn lanes(&self) -> &HashedLaneRegistry {
        &self.ctx.lanes
    }

    /// The visible elements whose footprint overlaps `obb`.
    pub fn query_overlapping(&self, obb: &OrientedBox) -> Vec<ElementId> {
        self.polygons
            .query_polygon(obb)
            .into_iter()
            .filter(|id| {
                self.elements
                    .get(*id)
                    .and_then(|element| element.visible_polygon())
                    .map_or(false, |poly| poly.overlaps(obb))
            })
            .collect()
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        self.debug.clone()
    }
}
