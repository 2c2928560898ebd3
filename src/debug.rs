use crate::math::{OrientedBox, Point2d};
#[cfg(feature = "debug")]
use serde_json::json;
#[cfg(feature = "debug")]
use std::sync::{Mutex, PoisonError};

/// Drawing primitives collected during one tick of one simulation.
///
/// Shared by every worker thread of the tick. Without the `debug` feature
/// nothing is recorded.
#[derive(Debug, Default)]
pub struct DebugFrame {
    #[cfg(feature = "debug")]
    items: Mutex<Vec<serde_json::Value>>,
}

impl DebugFrame {
    #[cfg(feature = "debug")]
    fn push(&self, value: serde_json::Value) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    #[allow(unused)]
    pub fn line(&self, name: &str, p1: Point2d, p2: Point2d) {
        #[cfg(feature = "debug")]
        self.push(json!({
            "type": "line",
            "name": name,
            "p1": [p1.x, p1.y],
            "p2": [p2.x, p2.y],
        }))
    }

    #[allow(unused)]
    pub fn polygon(&self, name: &str, obb: &OrientedBox) {
        #[cfg(feature = "debug")]
        self.push(json!({
            "type": "polygon",
            "name": name,
            "points": obb.vertices().map(|v| [v.x, v.y]),
        }))
    }

    /// Empties the frame, returning its primitives as a JSON array.
    #[cfg(feature = "debug")]
    pub fn take(&self) -> serde_json::Value {
        let items = std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner));
        json!(items)
    }
}

#[cfg(all(test, feature = "debug"))]
mod test {
    use super::*;

    #[test]
    fn frames_are_independent() {
        let a = DebugFrame::default();
        let b = DebugFrame::default();
        a.line("gap", Point2d::new(0.0, 0.0), Point2d::new(1.0, 0.0));
        assert_eq!(b.take(), json!([]));
        let taken = a.take();
        assert_eq!(taken.as_array().map(Vec::len), Some(1));
        assert_eq!(taken[0]["name"], "gap");
        assert_eq!(a.take(), json!([]));
    }
}
