use super::{bind_location, resolve_route_start, Base, ElementKind, LifeCycle};
use crate::context::RunContext;
use crate::error::InitError;
use crate::math::{rotate_deg, Vector2d};
use crate::output::ObstacleOutput;
use crate::scene::{Catalog, ObstacleAttributes};
use crate::time::TimeContext;
use crate::ElementId;

/// A static object placed on a lane.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub(crate) base: Base,
}

impl Obstacle {
    pub(crate) fn new(
        id: ElementId,
        attrs: &ObstacleAttributes,
        ctx: &RunContext,
        catalog: &Catalog,
    ) -> Result<Self, InitError> {
        let entry = catalog.resolve(&attrs.obstacle_type, attrs.dimensions);
        let life = LifeCycle::new(
            attrs.start_time,
            attrs.end_time.unwrap_or(ctx.config.max_lifetime),
        );
        let mut base = Base::new(
            id,
            ElementKind::Obstacle,
            attrs.id,
            &attrs.obstacle_type,
            life,
            &entry,
        )?;
        let proj = resolve_route_start(ctx, &attrs.route, attrs.lane_id)?;
        bind_location(
            &mut base.location,
            ctx,
            proj.info,
            proj.s + attrs.start_s,
            attrs.l_offset,
        )?;

        // A negative start angle orients the obstacle relative to the lane.
        let heading = if attrs.start_angle < 0.0 {
            rotate_deg(base.location.live().lane_dir_2d(), attrs.direction)
        } else {
            rotate_deg(Vector2d::unit_x(), attrs.start_angle)
        };
        base.location.live_mut().heading = heading;
        base.update_polygon(ctx);
        base.save_stable_state();
        log::info!("{} placed on {}", base.identity().sys_id(), proj.info);
        Ok(Self { base })
    }

    /// Obstacles do not move; only their life cycle advances.
    pub(crate) fn update(&mut self, ctx: &RunContext, _time: &TimeContext) {
        if self.base.life.is_running() && self.base.geometry.polygon().is_none() {
            self.base.update_polygon(ctx);
        }
    }

    pub(crate) fn output(&self, ctx: &RunContext) -> ObstacleOutput {
        ObstacleOutput {
            id: self.base.identity().id(),
            obstacle_type: self.base.type_name().to_owned(),
            pose: self.base.pose(ctx),
        }
    }
}
