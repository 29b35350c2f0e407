use std::fmt::Write;

pub const NO_DATA: &str = "No data available";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline { points: Vec<(f64, f64)> },
    Polygon { points: Vec<(f64, f64)> },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
    },
}

impl Shape {
    fn tag(&self) -> &'static str {
        match self {
            Shape::Rect { .. } => "rect",
            Shape::Line { .. } => "line",
            Shape::Polyline { .. } => "polyline",
            Shape::Polygon { .. } => "polygon",
            Shape::Circle { .. } => "circle",
            Shape::Text { .. } => "text",
        }
    }
}

/// A drawing primitive plus presentation attributes and an optional hover tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub shape: Shape,
    pub attrs: Vec<(&'static str, String)>,
    pub tooltip: Option<String>,
}

impl Element {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            attrs: Vec::new(),
            tooltip: None,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Shape::Rect { x, y, width, height })
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Shape::Line { x1, y1, x2, y2 })
    }

    pub fn polyline(points: Vec<(f64, f64)>) -> Self {
        Self::new(Shape::Polyline { points })
    }

    pub fn polygon(points: Vec<(f64, f64)>) -> Self {
        Self::new(Shape::Polygon { points })
    }

    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::new(Shape::Circle { cx, cy, r })
    }

    pub fn text(x: f64, y: f64, content: impl Into<String>) -> Self {
        Self::new(Shape::Text {
            x,
            y,
            content: content.into(),
        })
    }

    pub fn attr(mut self, name: &'static str, value: impl ToString) -> Self {
        self.attrs.push((name, value.to_string()));
        self
    }

    pub fn tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }

    /// Rotates the element around its own anchor point.
    pub fn rotate(self, degrees: f64, x: f64, y: f64) -> Self {
        let transform = format!("rotate({} {} {})", num(degrees), num(x), num(y));
        self.attr("transform", transform)
    }

    #[cfg(test)]
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    fn write_svg(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.shape.tag());
        match &self.shape {
            Shape::Rect { x, y, width, height } => {
                let _ = write!(
                    out,
                    r#" x="{}" y="{}" width="{}" height="{}""#,
                    num(*x),
                    num(*y),
                    num(*width),
                    num(*height)
                );
            }
            Shape::Line { x1, y1, x2, y2 } => {
                let _ = write!(
                    out,
                    r#" x1="{}" y1="{}" x2="{}" y2="{}""#,
                    num(*x1),
                    num(*y1),
                    num(*x2),
                    num(*y2)
                );
            }
            Shape::Polyline { points } | Shape::Polygon { points } => {
                let _ = write!(out, r#" points="{}""#, points_attr(points));
            }
            Shape::Circle { cx, cy, r } => {
                let _ = write!(out, r#" cx="{}" cy="{}" r="{}""#, num(*cx), num(*cy), num(*r));
            }
            Shape::Text { x, y, .. } => {
                let _ = write!(out, r#" x="{}" y="{}""#, num(*x), num(*y));
            }
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, r#" {}="{}""#, name, escape(value));
        }

        let content = self.text_content();
        if content.is_none() && self.tooltip.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(tooltip) = &self.tooltip {
            let _ = write!(out, "<title>{}</title>", escape(tooltip));
        }
        if let Some(content) = content {
            out.push_str(&escape(content));
        }
        let _ = write!(out, "</{}>", self.shape.tag());
    }
}

/// The container a chart renders into.
pub trait Surface {
    fn clear(&mut self);
    fn set_view_box(&mut self, width: f64, height: f64);
    fn push(&mut self, element: Element);
}

/// Live hover overlay. Static output carries tooltips as `<title>` only.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
struct Overlay {
    anchor: usize,
    text: String,
    x: f64,
    y: f64,
}

/// In-memory SVG document. Holds at most one live tooltip overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    elements: Vec<Element>,
    #[cfg(test)]
    overlay: Option<Overlay>,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[cfg(test)]
    pub fn view_box(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn texts(&self) -> Vec<&str> {
        self.elements.iter().filter_map(Element::text_content).collect()
    }

    #[cfg(test)]
    pub fn is_placeholder(&self) -> bool {
        self.texts() == vec![NO_DATA]
    }

    #[cfg(test)]
    /// Shows the tooltip of the mark at `index`, replacing any existing one.
    /// Returns false if that element has no tooltip.
    pub fn pointer_enter(&mut self, index: usize) -> bool {
        let Some(element) = self.elements.get(index) else {
            return false;
        };
        let Some(text) = element.tooltip.clone() else {
            return false;
        };
        let (x, y) = anchor_point(&element.shape);
        self.overlay = Some(Overlay {
            anchor: index,
            text,
            x: x + 10.0,
            y: y - 10.0,
        });
        true
    }

    #[cfg(test)]
    pub fn pointer_leave(&mut self) {
        self.overlay = None;
    }

    #[cfg(test)]
    pub fn active_tooltip(&self) -> Option<&str> {
        self.overlay.as_ref().map(|overlay| overlay.text.as_str())
    }

    #[cfg(test)]
    pub fn tooltip_anchor(&self) -> Option<usize> {
        self.overlay.as_ref().map(|overlay| overlay.anchor)
    }

    /// Serializes to a responsive `<svg>`: no fixed size, only a view box.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="{}" viewBox="0 0 {} {}" preserveAspectRatio="xMidYMid meet">"#,
            SVG_NS,
            num(self.width),
            num(self.height)
        );
        for element in &self.elements {
            element.write_svg(&mut out);
        }
        #[cfg(test)]
        {
            if let Some(overlay) = &self.overlay {
                let _ = write!(
                    out,
                    r#"<g class="tooltip"><text x="{}" y="{}">{}</text></g>"#,
                    num(overlay.x),
                    num(overlay.y),
                    escape(&overlay.text)
                );
            }
        }
        out.push_str("</svg>");
        out
    }
}

impl Surface for SvgCanvas {
    fn clear(&mut self) {
        self.elements.clear();
        #[cfg(test)]
        {
            self.overlay = None;
        }
    }

    fn set_view_box(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn push(&mut self, element: Element) {
        self.elements.push(element);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Fixed logical canvas with margins around the plot area.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub margin: Margins,
}

impl Frame {
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Plot-area coordinates to canvas coordinates.
    pub fn at(&self, x: f64, y: f64) -> (f64, f64) {
        (self.margin.left + x, self.margin.top + y)
    }
}

pub fn render_placeholder(surface: &mut impl Surface, width: f64, height: f64) {
    surface.push(
        Element::text(width / 2.0, height / 2.0, NO_DATA)
            .attr("text-anchor", "middle")
            .attr("class", "no-data"),
    );
}

pub fn title(surface: &mut impl Surface, x: f64, y: f64, text: &str) {
    surface.push(
        Element::text(x, y, text)
            .attr("text-anchor", "middle")
            .attr("class", "chart-title"),
    );
}

#[cfg(test)]
fn anchor_point(shape: &Shape) -> (f64, f64) {
    match shape {
        Shape::Rect { x, y, width, .. } => (x + width / 2.0, *y),
        Shape::Line { x2, y2, .. } => (*x2, *y2),
        Shape::Polyline { points } | Shape::Polygon { points } => {
            points.first().copied().unwrap_or((0.0, 0.0))
        }
        Shape::Circle { cx, cy, .. } => (*cx, *cy),
        Shape::Text { x, y, .. } => (*x, *y),
    }
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compact number formatting for coordinates: at most two decimals, no trailing zeros.
pub fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(70.0), "70");
        assert_eq!(num(12.346), "12.35");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn text_is_escaped() {
        let mut canvas = SvgCanvas::new();
        canvas.set_view_box(10.0, 10.0);
        canvas.push(Element::text(1.0, 2.0, "a < b & \"c\"").tooltip("x>y"));
        assert_eq!(
            canvas.to_svg(),
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" "#,
                r#"preserveAspectRatio="xMidYMid meet">"#,
                r#"<text x="1" y="2"><title>x&gt;y</title>"#,
                r#"a &lt; b &amp; &quot;c&quot;</text></svg>"#
            )
        );
    }

    #[test]
    fn at_most_one_tooltip_is_live() {
        let mut canvas = SvgCanvas::new();
        canvas.push(Element::circle(10.0, 10.0, 3.0).tooltip("first"));
        canvas.push(Element::circle(20.0, 20.0, 3.0).tooltip("second"));
        canvas.push(Element::line(0.0, 0.0, 1.0, 1.0));

        assert!(canvas.pointer_enter(0));
        assert!(canvas.pointer_enter(1));
        assert_eq!(canvas.active_tooltip(), Some("second"));
        assert_eq!(canvas.to_svg().matches(r#"class="tooltip""#).count(), 1);

        assert!(!canvas.pointer_enter(2));
        assert!(!canvas.pointer_enter(99));
        assert_eq!(canvas.tooltip_anchor(), Some(1));

        canvas.pointer_leave();
        assert_eq!(canvas.active_tooltip(), None);
        assert!(!canvas.to_svg().contains(r#"class="tooltip""#));
    }

    #[test]
    fn clear_drops_elements_and_overlay() {
        let mut canvas = SvgCanvas::new();
        canvas.push(Element::circle(10.0, 10.0, 3.0).tooltip("dot"));
        canvas.pointer_enter(0);
        canvas.clear();
        assert!(canvas.elements().is_empty());
        assert_eq!(canvas.active_tooltip(), None);
    }

    #[test]
    fn frame_inner_dimensions() {
        let frame = Frame {
            width: 600.0,
            height: 300.0,
            margin: Margins {
                top: 20.0,
                right: 30.0,
                bottom: 60.0,
                left: 70.0,
            },
        };
        assert_eq!(frame.inner_width(), 500.0);
        assert_eq!(frame.inner_height(), 220.0);
        assert_eq!(frame.at(0.0, 0.0), (70.0, 20.0));
    }
}
