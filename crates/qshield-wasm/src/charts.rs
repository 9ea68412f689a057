//! Chart bridge to a JavaScript charting library.
//!
//! The page hands over one object implementing the four chart operations:
//!
//! ```js
//! const bridge = {
//!   construct(containerId, specJson) { /* return a numeric handle, or null */ },
//!   append(handle, label, values) { /* values: Float64Array, one per dataset */ },
//!   redraw(handle) {},
//!   destroy(handle) {},
//! };
//! ```
//!
//! `specJson` is the serialized [`ChartSpec`]: kind, dataset labels and
//! colors, capacity and optional y range. The bridge must keep at most
//! `capacity` points per chart.

use qshield_core::{ChartBackend, ChartHandle, ChartSpec};
use wasm_bindgen::prelude::*;

const METHODS: [&str; 4] = ["construct", "append", "redraw", "destroy"];

pub struct JsCharts {
    bridge: JsValue,
}

fn method(target: &JsValue, name: &str) -> Option<js_sys::Function> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()
}

fn handle_value(handle: ChartHandle) -> JsValue {
    JsValue::from_f64(handle.raw() as f64)
}

impl JsCharts {
    /// Wrap `bridge`, rejecting objects that lack any of the four methods.
    pub fn new(bridge: JsValue) -> Result<Self, JsValue> {
        if let Some(missing) = METHODS.iter().find(|m| method(&bridge, m).is_none()) {
            return Err(JsValue::from_str(&format!(
                "chart bridge has no '{missing}' function"
            )));
        }
        Ok(Self { bridge })
    }

    fn call(&self, name: &str, args: &js_sys::Array) -> Option<JsValue> {
        let f = method(&self.bridge, name)?;
        match f.apply(&self.bridge, args) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("chart bridge {name} threw: {e:?}");
                None
            }
        }
    }
}

impl ChartBackend for JsCharts {
    fn construct(&mut self, container: &str, spec: &ChartSpec) -> Option<ChartHandle> {
        let json = match serde_json::to_string(spec) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("cannot serialize chart spec: {e}");
                return None;
            }
        };
        let args = js_sys::Array::of2(&JsValue::from_str(container), &JsValue::from_str(&json));
        let raw = self.call("construct", &args)?.as_f64()?;
        (raw.is_finite() && raw >= 0.0).then(|| ChartHandle::new(raw as u64))
    }

    fn append_point(&mut self, handle: ChartHandle, label: &str, values: &[f64]) {
        let values = js_sys::Float64Array::from(values);
        let args = js_sys::Array::of3(&handle_value(handle), &JsValue::from_str(label), &values);
        self.call("append", &args);
    }

    fn redraw(&mut self, handle: ChartHandle) {
        self.call("redraw", &js_sys::Array::of1(&handle_value(handle)));
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.call("destroy", &js_sys::Array::of1(&handle_value(handle)));
    }
}
