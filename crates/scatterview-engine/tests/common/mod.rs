//! Recording renderer shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{bail, Result};
use scatterview_engine::annotation::AxisLabel;
use scatterview_engine::coords::Viewport;
use scatterview_engine::pipeline::FrameState;
use scatterview_engine::vertex::{BufferUsage, PrimitiveType, Vertex, VertexBuffer};
use scatterview_engine::{DrawTarget, RenderStates, Renderer};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateTarget(Viewport, bool),
    Draw { is_3d: bool },
    Vertices(PrimitiveType, usize),
    Buffer { usage: BufferUsage, revision: u64 },
    Annotation(usize),
    Finalize,
    Release,
}

/// What the tests can observe and steer from outside the GPU thread.
#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<Event>>,
    pub threads: Mutex<Vec<Option<String>>>,
    pub fail_draw: AtomicBool,
    pub panic_draw: AtomicBool,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        if let Ok(mut threads) = self.threads.lock() {
            threads.push(thread::current().name().map(str::to_owned));
        }
    }
}

/// Fills frames with `[row, column, 0, 255]` so row order is checkable.
pub struct MockRenderer {
    rec: Arc<Recorder>,
    target: Option<Viewport>,
    pixels: Vec<u8>,
    has_pixels: bool,
}

impl MockRenderer {
    pub fn new(rec: Arc<Recorder>) -> Self {
        Self { rec, target: None, pixels: Vec::new(), has_pixels: false }
    }
}

impl DrawTarget for MockRenderer {
    fn draw_vertices(&mut self, kind: PrimitiveType, vertices: &[Vertex], _states: &RenderStates) {
        self.rec.push(Event::Vertices(kind, vertices.len()));
    }

    fn draw_buffer(&mut self, buffer: &VertexBuffer, states: &RenderStates) {
        self.rec.push(Event::Buffer { usage: buffer.usage(), revision: buffer.revision() });
        self.draw_vertices(buffer.kind(), buffer.as_slice(), states);
    }
}

impl Renderer for MockRenderer {
    fn create_target(&mut self, viewport: Viewport, is_3d: bool) -> Result<()> {
        self.rec.push(Event::CreateTarget(viewport, is_3d));
        self.target = Some(viewport);
        self.has_pixels = false;
        Ok(())
    }

    fn draw(&mut self, frame: &FrameState) -> Result<()> {
        if self.rec.panic_draw.load(Ordering::SeqCst) {
            panic!("mock draw panicked");
        }
        if self.rec.fail_draw.load(Ordering::SeqCst) {
            bail!("mock draw failed");
        }
        if self.target != Some(frame.viewport) {
            bail!("viewport mismatch");
        }
        self.rec.push(Event::Draw { is_3d: frame.is_3d });
        Ok(())
    }

    fn target(&mut self) -> &mut dyn DrawTarget {
        self
    }

    fn draw_annotation(&mut self, _frame: &FrameState, labels: &[AxisLabel]) -> Result<()> {
        self.rec.push(Event::Annotation(labels.len()));
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let Some(vp) = self.target else { bail!("no target") };
        self.pixels.clear();
        for y in 0..vp.height {
            for x in 0..vp.width {
                self.pixels.extend_from_slice(&[y as u8, x as u8, 0, 255]);
            }
        }
        self.has_pixels = true;
        self.rec.push(Event::Finalize);
        Ok(())
    }

    fn pixels(&self) -> Option<&[u8]> {
        self.has_pixels.then_some(self.pixels.as_slice())
    }

    fn release(&mut self) {
        self.rec.push(Event::Release);
        self.target = None;
        self.has_pixels = false;
    }
}

pub fn recorder() -> Arc<Recorder> {
    Arc::new(Recorder::default())
}

pub fn factory(rec: &Arc<Recorder>) -> impl FnOnce() -> Result<MockRenderer> + Send + 'static {
    let rec = Arc::clone(rec);
    move || Ok(MockRenderer::new(rec))
}
