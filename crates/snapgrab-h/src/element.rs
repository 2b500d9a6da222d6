//! Element handles over CDP.
//!
//! Ancestors have no node handle of their own; a [`CdpElement`] addresses them
//! as "the element `depth` levels above this node" and inspects them through
//! JavaScript evaluated on the original node.

use async_trait::async_trait;
use chromiumoxide::element::Element;
use serde_json::Value;
use snapgrab_engine::session::{ElementHandle, SessionError};
use std::sync::Arc;

pub struct CdpElement {
    node: Arc<Element>,
    depth: usize,
}

impl CdpElement {
    pub fn new(element: Element) -> Self {
        Self {
            node: Arc::new(element),
            depth: 0,
        }
    }

    /// Wrap `body` so that `el` is the targeted ancestor, or `null` is returned
    /// when the chain runs out.
    fn script(&self, body: &str) -> String {
        format!(
            "function() {{ let el = this; for (let i = 0; i < {} && el; i++) {{ el = el.parentElement; }} if (!el) {{ return null; }} {} }}",
            self.depth, body
        )
    }

    async fn eval(&self, body: &str) -> Result<Option<Value>, SessionError> {
        let returns = self
            .node
            .call_js_fn(self.script(body), false)
            .await
            .map_err(|e| SessionError::Element(e.to_string()))?;
        Ok(returns.result.value)
    }
}

const VISIBLE_BODY: &str = "const s = window.getComputedStyle(el); \
     const r = el.getBoundingClientRect(); \
     return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0' \
     && r.width > 0 && r.height > 0;";

const SIZE_BODY: &str =
    "const r = el.getBoundingClientRect(); return JSON.stringify([r.width, r.height]);";

#[async_trait]
impl ElementHandle for CdpElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        if self.depth == 0 {
            return self
                .node
                .attribute(name)
                .await
                .map_err(|e| SessionError::Element(e.to_string()));
        }
        let quoted = serde_json::to_string(name).map_err(|e| SessionError::Other(e.to_string()))?;
        let body = format!("return el.getAttribute({});", quoted);
        Ok(match self.eval(&body).await? {
            Some(Value::String(value)) => Some(value),
            _ => None,
        })
    }

    async fn is_visible(&self) -> Result<bool, SessionError> {
        Ok(matches!(self.eval(VISIBLE_BODY).await?, Some(Value::Bool(true))))
    }

    async fn bounding_size(&self) -> Result<(f64, f64), SessionError> {
        match self.eval(SIZE_BODY).await? {
            Some(Value::String(json)) => serde_json::from_str::<(f64, f64)>(&json)
                .map_err(|e| SessionError::Element(format!("bad size payload: {}", e))),
            other => Err(SessionError::Element(format!(
                "no bounding box: {:?}",
                other
            ))),
        }
    }

    async fn parent(&self) -> Result<Option<Box<dyn ElementHandle>>, SessionError> {
        let has_parent = self.eval("return el.parentElement !== null;").await?;
        if !matches!(has_parent, Some(Value::Bool(true))) {
            return Ok(None);
        }
        Ok(Some(Box::new(CdpElement {
            node: Arc::clone(&self.node),
            depth: self.depth + 1,
        })))
    }
}
