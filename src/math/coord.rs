use super::{rot90, GeoReference, Point2d, Point3d, Vector2d, Wgs84};
use once_cell::sync::OnceCell;

/// A position held in geodetic or local form, whichever it was set from.
///
/// The other form is computed on first request and cached. Every mutation
/// replaces the whole value, so a cached counterpart never goes stale.
#[derive(Clone, Debug)]
pub struct Coord {
    wgs84: OnceCell<Wgs84>,
    enu: OnceCell<Point3d>,
}

impl Default for Coord {
    fn default() -> Self {
        Self::from_enu(Point3d::new(0.0, 0.0, 0.0))
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        match (self.enu.get(), other.enu.get()) {
            (Some(a), Some(b)) => a == b,
            _ => self.wgs84.get() == other.wgs84.get(),
        }
    }
}

impl Coord {
    pub fn from_wgs84(pos: Wgs84) -> Self {
        Self {
            wgs84: OnceCell::with_value(pos),
            enu: OnceCell::new(),
        }
    }

    pub fn from_enu(pos: Point3d) -> Self {
        Self {
            wgs84: OnceCell::new(),
            enu: OnceCell::with_value(pos),
        }
    }

    /// True if the geodetic form has been computed or was given.
    pub fn has_wgs84(&self) -> bool {
        self.wgs84.get().is_some()
    }

    /// True if the local form has been computed or was given.
    pub fn has_enu(&self) -> bool {
        self.enu.get().is_some()
    }

    pub fn wgs84(&self, geo: &GeoReference) -> Wgs84 {
        *self.wgs84.get_or_init(|| match self.enu.get() {
            Some(enu) => geo.to_wgs84(*enu),
            None => geo.origin(),
        })
    }

    pub fn enu(&self, geo: &GeoReference) -> Point3d {
        *self.enu.get_or_init(|| match self.wgs84.get() {
            Some(pos) => geo.to_enu(*pos),
            None => Point3d::new(0.0, 0.0, 0.0),
        })
    }

    pub fn enu_2d(&self, geo: &GeoReference) -> Point2d {
        let enu = self.enu(geo);
        Point2d::new(enu.x, enu.y)
    }

    /// Moves the position by a horizontal step in the local frame.
    pub fn translate(&mut self, step: Vector2d, geo: &GeoReference) {
        let enu = self.enu(geo);
        *self = Self::from_enu(Point3d::new(enu.x + step.x, enu.y + step.y, enu.z));
    }

    /// The position displaced `offset` metres to the left of `dir`.
    /// A negative offset displaces to the right.
    pub fn lane_offset(&self, dir: Vector2d, offset: f64, geo: &GeoReference) -> Self {
        let mut res = self.clone();
        if let Some(dir) = super::try_normalize(dir) {
            res.translate(rot90(dir) * offset, geo);
        }
        res
    }
}
