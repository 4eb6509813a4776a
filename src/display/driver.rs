//! A worker that keeps a display showing whatever was most recently asked of it.
//!
//! The driver owns the `Display` outright and runs on a thread of its own. Other threads talk to
//! it through a `Handle`, which swaps in a new `Request` and wakes the worker. A request is
//! either static text, drawn once, or text scrolled through the array a column at a time, which
//! is abandoned at the next column as soon as a newer request arrives.

use std::fmt::Debug;
use std::io;
use std::num::NonZeroU32;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, trace};

use crate::canvas::{Canvas, Rendered};
use crate::display::Display;
use crate::interface;

/// How requested text is put on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Animation {
    /// Draw the text once, left aligned, cropped to the width of the array.
    Static,
    /// Scroll the text through the array, one column every `interval`, `repeat` times over (or
    /// until superseded, if `None`), then scroll it off.
    Scroll {
        interval: Duration,
        repeat: Option<NonZeroU32>,
    },
}

/// Everything the driver needs to know about what to show. Always replaced as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub text: String,
    pub animation: Animation,
}

impl Request {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Request {
            text: text.into(),
            animation: Animation::Static,
        }
    }

    pub fn scroll<S: Into<String>>(text: S, interval: Duration, repeat: Option<NonZeroU32>) -> Self {
        Request {
            text: text.into(),
            animation: Animation::Scroll { interval, repeat },
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Request::text("")
    }
}

struct Slot {
    request: Request,
    /// Set with every new request, cleared when the worker picks one up.
    woken: bool,
}

/// The state shared between the worker and its handles.
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

impl Shared {
    fn new(request: Request) -> Self {
        Shared {
            slot: Mutex::new(Slot {
                request,
                woken: false,
            }),
            wake: Condvar::new(),
        }
    }

    // A panic elsewhere can't leave the slot half written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, request: Request) {
        let mut slot = self.lock();
        slot.request = request;
        slot.woken = true;
        drop(slot);
        self.wake.notify_all();
    }

    /// Pick up the current request and lower the wake signal.
    fn take(&self) -> Request {
        let mut slot = self.lock();
        slot.woken = false;
        slot.request.clone()
    }

    fn current(&self) -> Request {
        self.lock().request.clone()
    }

    /// Block until a new request is submitted, or until `timeout` passes if one is given.
    /// Returns whether a new request is waiting.
    fn wait(&self, timeout: Option<Duration>) -> bool {
        let slot = self.lock();
        match timeout {
            Some(timeout) => {
                let (slot, _) = self
                    .wake
                    .wait_timeout_while(slot, timeout, |s| !s.woken)
                    .unwrap_or_else(PoisonError::into_inner);
                slot.woken
            }
            None => {
                let slot = self
                    .wake
                    .wait_while(slot, |s| !s.woken)
                    .unwrap_or_else(PoisonError::into_inner);
                slot.woken
            }
        }
    }
}

/// A cheap, cloneable way to tell a running driver what to show. Requests never queue: each one
/// replaces the last, and the driver only ever acts on the newest.
#[derive(Clone)]
pub struct Handle {
    shared: Arc<Shared>,
}

impl Handle {
    /// Replace whatever is being shown with `request`.
    pub fn submit(&self, request: Request) {
        debug!("accepted {:?}", request);
        self.shared.submit(request);
    }

    /// Show `text` statically.
    pub fn set_text<S: Into<String>>(&self, text: S) {
        self.submit(Request::text(text))
    }

    /// Scroll `text`, advancing a column every `interval`, `repeat` times or until superseded.
    pub fn set_scroll<S: Into<String>>(
        &self,
        text: S,
        interval: Duration,
        repeat: Option<NonZeroU32>,
    ) {
        self.submit(Request::scroll(text, interval, repeat))
    }

    /// The most recently submitted request.
    pub fn current(&self) -> Request {
        self.shared.current()
    }
}

/// The display driver. Build one around a `Display`, then `spawn` it.
pub struct Driver<DI>
where
    DI: interface::DisplayInterface,
{
    display: Display<DI>,
    shared: Arc<Shared>,
}

impl<DI> Driver<DI>
where
    DI: interface::DisplayInterface,
    DI::Error: Debug,
{
    /// Create a driver that starts out blanking the display.
    pub fn new(display: Display<DI>) -> Self {
        Driver {
            display,
            shared: Arc::new(Shared::new(Request::default())),
        }
    }

    pub fn handle(&self) -> Handle {
        Handle {
            shared: self.shared.clone(),
        }
    }

    /// Start the driver on a new thread.
    pub fn spawn(self) -> io::Result<(Handle, JoinHandle<()>)>
    where
        DI: Send + 'static,
    {
        let handle = self.handle();
        let worker = thread::Builder::new()
            .name("minishift-driver".into())
            .spawn(move || self.run())?;
        Ok((handle, worker))
    }

    /// Run the driver on the current thread, forever.
    pub fn run(mut self) -> ! {
        loop {
            let request = self.shared.take();
            match request.animation {
                Animation::Static => self.show(&request.text),
                Animation::Scroll { interval, repeat } => {
                    self.scroll(&request.text, interval, repeat)
                }
            }
        }
    }

    fn show(&mut self, text: &str) {
        info!("showing {:?}", text);
        let rendered = self.display.blank().render(0, text);
        report(&rendered);
        self.display.set_canvas(rendered.canvas);
        self.update();
        self.shared.wait(None);
    }

    fn scroll(&mut self, text: &str, interval: Duration, repeat: Option<NonZeroU32>) {
        match repeat {
            Some(times) => info!("scrolling {:?} every {:?}, {} times", text, interval, times),
            None => info!("scrolling {:?} every {:?}", text, interval),
        }
        let rendered = Canvas::unbounded().render(0, text);
        report(&rendered);
        let canvas = rendered.canvas;

        // Nothing to scroll means nothing to wait for, even when told to repeat forever.
        if !canvas.is_empty() {
            match repeat {
                Some(times) => {
                    for _ in 0..times.get() {
                        if self.scroll_pass(&canvas, interval) {
                            return;
                        }
                    }
                }
                None => loop {
                    if self.scroll_pass(&canvas, interval) {
                        return;
                    }
                },
            }
        }

        // Shift the tail of the text off the end of the array.
        let blank = self.display.blank();
        self.display.set_canvas(blank);
        self.update();
        self.shared.wait(None);
    }

    /// Feed `canvas` through the array once. Returns true if cut short by a new request.
    fn scroll_pass(&mut self, canvas: &Canvas, interval: Duration) -> bool {
        for frame in canvas.scroll() {
            self.push(&frame);
            if self.shared.wait(Some(interval)) {
                debug!("scroll interrupted");
                return true;
            }
        }
        false
    }

    /// Send the display's built-in canvas.
    fn update(&mut self) {
        trace!("frame:\n{}", self.display.canvas());
        sent(self.display.update());
    }

    fn push(&mut self, canvas: &Canvas) {
        trace!("frame:\n{}", canvas);
        sent(self.display.push(canvas));
    }
}

fn sent<E: Debug>(result: Result<(), E>) {
    if let Err(e) = result {
        error!("failed to update display: {:?}", e);
    }
}

fn report(rendered: &Rendered) {
    for e in &rendered.suppressed {
        debug!("display degraded: {}", e);
    }
}
