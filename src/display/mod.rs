//! The display: a chain of Minishifts of known physical width behind one transport. The
//! `driver` submodule runs a display from a worker thread.

pub mod driver;

use std::mem;

use crate::canvas::Canvas;
use crate::interface;

/// A chain of Minishifts.
pub struct Display<DI>
where
    DI: interface::DisplayInterface,
{
    iface: DI,
    width: usize,
    canvas: Canvas,
}

impl<DI> Display<DI>
where
    DI: interface::DisplayInterface,
{
    /// Construct a display `width` columns wide (eight per Minishift module), connected to the
    /// interface `iface`.
    ///
    /// Panics if `width` is zero.
    pub fn new(iface: DI, width: usize) -> Self {
        if width == 0 {
            panic!("Display width must be at least one column.");
        }
        Display {
            iface,
            width,
            canvas: Canvas::new(width),
        }
    }

    /// The physical width of the array, in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// A blank canvas exactly as wide as the array.
    pub fn blank(&self) -> Canvas {
        Canvas::new(self.width)
    }

    /// The built-in canvas, which `update` sends. Starts out blank and as wide as the array.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Replace the built-in canvas, returning the old one.
    pub fn set_canvas(&mut self, canvas: Canvas) -> Canvas {
        mem::replace(&mut self.canvas, canvas)
    }

    /// Push the built-in canvas to the array.
    pub fn update(&mut self) -> Result<(), DI::Error> {
        self.iface.send(self.canvas.as_bytes())
    }

    /// Push `canvas` to the array instead of the built-in one. Canvases narrower than the array
    /// shift the existing image along by their width; wider ones push their leftmost columns off
    /// the end.
    pub fn push(&mut self, canvas: &Canvas) -> Result<(), DI::Error> {
        self.iface.send(canvas.as_bytes())
    }

    /// Give back the interface.
    pub fn release(self) -> DI {
        self.iface
    }
}
