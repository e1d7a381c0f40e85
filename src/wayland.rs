// Wayland integration module
// Hosts the xdg window, the drag-and-drop target and the frame-callback
// driven redraw loop, using smithay-client-toolkit

use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    data_device_manager::{
        data_device::{DataDevice, DataDeviceHandler},
        data_offer::{DataOfferHandler, DragOffer},
        data_source::DataSourceHandler,
        DataDeviceManagerState, WritePipe,
    },
    delegate_compositor, delegate_data_device, delegate_keyboard, delegate_output,
    delegate_registry, delegate_seat, delegate_shm, delegate_xdg_shell, delegate_xdg_window,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        xdg::{
            window::{Window, WindowConfigure, WindowDecorations, WindowHandler},
            XdgShell,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use wayland_client::{
    globals::registry_queue_init,
    protocol::{
        wl_data_device::WlDataDevice, wl_data_device_manager::DndAction,
        wl_data_source::WlDataSource, wl_keyboard, wl_output, wl_seat, wl_shm, wl_surface,
    },
    Connection, Proxy, QueueHandle,
};

use crate::assets;
use crate::background::Background;
use crate::cli::ViewConfig;
use crate::render::Canvas;
use crate::scene::Scene;
use crate::state::{ViewEvent, ViewStateMachine};
use crate::uri;
use crate::wgpu_renderer::GpuPresenter;

/// The only drag mime type the view accepts
const URI_LIST_MIME: &str = "text/uri-list";

/// Minimum window size
const MIN_SIZE: u32 = 200;

/// Maximum window size to prevent buffer allocation failures
const MAX_SIZE: u32 = 4096;

/// Maximum shm buffer size (64MB to avoid Wayland buffer issues)
const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Main Wayland application state
struct TicketApp {
    // Registry state
    registry_state: RegistryState,
    // Seat state for input handling
    seat_state: SeatState,
    // Output state for display info
    output_state: OutputState,
    // Shared memory for buffer allocation
    shm: Shm,
    // Compositor state
    compositor_state: CompositorState,
    // xdg shell for the toplevel window
    xdg_shell: XdgShell,
    // Drag-and-drop plumbing
    data_device_manager: DataDeviceManagerState,
    data_device: Option<DataDevice>,

    // Wayland display pointer (for GPU presentation)
    display_ptr: *mut std::ffi::c_void,

    // View logic
    machine: ViewStateMachine,
    scene: Scene,

    // Surface and buffer management
    window: Option<Window>,
    pool: Option<SlotPool>,
    buffer: Option<Buffer>,
    width: u32,
    height: u32,
    configured: bool,
    // One outstanding frame callback at a time
    pending_frame: bool,

    should_exit: bool,

    // GPU presentation
    use_gpu: bool,
    gpu: Option<GpuPresenter>,
    gpu_initialized: bool,
    // Scratch canvas for the GPU path
    canvas: Vec<u8>,
}

impl TicketApp {
    #[allow(clippy::too_many_arguments)]
    fn new(
        registry_state: RegistryState,
        seat_state: SeatState,
        output_state: OutputState,
        shm: Shm,
        compositor_state: CompositorState,
        xdg_shell: XdgShell,
        data_device_manager: DataDeviceManagerState,
        display_ptr: *mut std::ffi::c_void,
        machine: ViewStateMachine,
        scene: Scene,
        config: &ViewConfig,
    ) -> Self {
        Self {
            registry_state,
            seat_state,
            output_state,
            shm,
            compositor_state,
            xdg_shell,
            data_device_manager,
            data_device: None,
            display_ptr,
            machine,
            scene,
            window: None,
            pool: None,
            buffer: None,
            width: config.width,
            height: config.height,
            configured: false,
            pending_frame: false,
            should_exit: false,
            use_gpu: config.use_gpu,
            gpu: None,
            gpu_initialized: false,
            canvas: Vec::new(),
        }
    }

    /// The offer of the drag currently over the window, if any
    fn drag_offer(&self) -> Option<DragOffer> {
        self.data_device.as_ref().and_then(|d| d.data().drag_offer())
    }

    /// Initialize the GPU presenter from the window surface
    fn init_gpu(&mut self) {
        if self.gpu_initialized {
            return;
        }

        let window = match &self.window {
            Some(window) => window,
            None => {
                warn!("Cannot init GPU: no window yet");
                return;
            }
        };

        let surface_ptr = window.wl_surface().id().as_ptr() as *mut std::ffi::c_void;
        if self.display_ptr.is_null() {
            warn!("Display pointer is null, falling back to CPU rendering");
            self.use_gpu = false;
            return;
        }

        match GpuPresenter::new(self.display_ptr, surface_ptr, self.width, self.height) {
            Ok(presenter) => {
                self.gpu = Some(presenter);
                self.gpu_initialized = true;
                info!("GPU presenter initialized successfully");
            }
            Err(e) => {
                warn!("Failed to initialize GPU presenter: {:?}", e);
                warn!("Falling back to CPU rendering");
                self.use_gpu = false;
            }
        }
    }

    /// Ask the compositor for the next frame callback, at most one at a time
    fn request_frame(&mut self, qh: &QueueHandle<Self>) {
        if self.pending_frame {
            return;
        }
        if let Some(window) = &self.window {
            let surface = window.wl_surface();
            surface.frame(qh, surface.clone());
            self.pending_frame = true;
        }
    }

    /// Compose and present one frame, then schedule the next one
    fn draw(&mut self, qh: &QueueHandle<Self>) {
        if !self.configured || self.window.is_none() {
            return;
        }

        let now = Instant::now();
        // the reveal delay rides the frame clock
        self.machine.tick(now);

        self.width = self.width.clamp(MIN_SIZE, MAX_SIZE);
        self.height = self.height.clamp(MIN_SIZE, MAX_SIZE);

        if self.use_gpu && self.gpu.is_some() {
            if self.draw_gpu(qh, now) {
                return;
            }
            debug!("GPU presentation skipped, drawing via shm");
        }

        self.draw_cpu(qh, now);
    }

    /// Compose into the scratch canvas and present through wgpu
    fn draw_gpu(&mut self, qh: &QueueHandle<Self>, now: Instant) -> bool {
        let (width, height) = (self.width, self.height);
        self.canvas.resize((width * height * 4) as usize, 0);
        {
            let mut frame = Canvas::new(&mut self.canvas, width, height);
            self.scene.draw(&mut frame, &self.machine, now);
        }

        // presenting commits the surface; the callback request must precede it
        self.request_frame(qh);

        match self
            .gpu
            .as_mut()
            .expect("draw_gpu called without presenter")
            .present_frame(&self.canvas, width, height)
        {
            Ok(presented) => presented,
            Err(e) => {
                warn!("GPU present error: {:?}", e);
                false
            }
        }
    }

    /// Compose directly into a shm buffer and commit it
    fn draw_cpu(&mut self, qh: &QueueHandle<Self>, now: Instant) {
        let width = self.width;
        let height = self.height;
        let stride = width as i32 * 4;
        let buffer_size = (stride * height as i32) as usize;

        if buffer_size > MAX_BUFFER_SIZE {
            error!(
                "Buffer size too large: {} bytes, max: {} bytes",
                buffer_size, MAX_BUFFER_SIZE
            );
            return;
        }

        if self.pool.is_none() {
            match SlotPool::new(buffer_size, &self.shm) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    error!(
                        "Failed to create slot pool: {}. Buffer size: {} bytes",
                        e, buffer_size
                    );
                    return;
                }
            }
        }

        let pool = self.pool.as_mut().unwrap();
        if pool.len() < buffer_size {
            if let Err(e) = pool.resize(buffer_size) {
                error!("Failed to resize pool to {} bytes: {}", buffer_size, e);
                self.pool = None;
                return;
            }
        }

        // the view is opaque, so the X variant is the right pixel format
        let (buffer, canvas) = match pool.create_buffer(
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Xrgb8888,
        ) {
            Ok(buf) => buf,
            Err(e) => {
                error!("Failed to create buffer {}x{}: {}", width, height, e);
                return;
            }
        };

        {
            let mut frame = Canvas::new(canvas, width, height);
            self.scene.draw(&mut frame, &self.machine, now);
        }

        self.request_frame(qh);

        let window = self.window.as_ref().unwrap();
        let surface = window.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            error!("Failed to attach buffer: {}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();

        self.buffer = Some(buffer);
    }
}

impl CompositorHandler for TicketApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
        debug!("Scale factor changed");
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
        debug!("Transform changed");
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        // the animation never idles; every callback redraws and re-arms
        self.pending_frame = false;
        self.draw(qh);
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for TicketApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("New output detected");
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output updated");
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output destroyed");
    }
}

impl WindowHandler for TicketApp {
    fn request_close(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _window: &Window) {
        info!("Window close requested");
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _window: &Window,
        configure: WindowConfigure,
        _serial: u32,
    ) {
        debug!("Window configured: {:?}", configure.new_size);

        let width = configure
            .new_size
            .0
            .map(|w| w.get())
            .unwrap_or(self.width)
            .clamp(MIN_SIZE, MAX_SIZE);
        let height = configure
            .new_size
            .1
            .map(|h| h.get())
            .unwrap_or(self.height)
            .clamp(MIN_SIZE, MAX_SIZE);

        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            // Reset pool to force buffer recreation
            self.pool = None;
            if let Some(gpu) = &mut self.gpu {
                gpu.resize(width, height);
            }
        }

        self.configured = true;

        if self.use_gpu && !self.gpu_initialized {
            self.init_gpu();
        }

        self.draw(qh);
    }
}

impl SeatHandler for TicketApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat) {
        debug!("New seat");
        // drags arrive through the seat's data device
        if self.data_device.is_none() {
            self.data_device = Some(self.data_device_manager.get_data_device(qh, &seat));
        }
    }

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        debug!("New capability: {:?}", capability);

        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                error!("Failed to get keyboard: {}", e);
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        _capability: Capability,
    ) {
        debug!("Capability removed");
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("Seat removed");
        self.data_device = None;
    }
}

impl KeyboardHandler for TicketApp {
    fn enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
        _raw: &[u32],
        _keysyms: &[Keysym],
    ) {
        debug!("Keyboard entered surface");
    }

    fn leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
    ) {
        debug!("Keyboard left surface");
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        debug!("Key pressed: {:?}", event.keysym);

        // Close on Escape or Q key
        if event.keysym == Keysym::Escape || event.keysym == Keysym::q {
            info!("Exit key pressed");
            self.should_exit = true;
        }
    }

    fn release_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _event: KeyEvent,
    ) {
    }

    fn update_modifiers(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _modifiers: Modifiers,
        _layout: u32,
    ) {
    }
}

impl DataDeviceHandler for TicketApp {
    fn enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _data_device: &WlDataDevice,
        x: f64,
        y: f64,
        _surface: &wl_surface::WlSurface,
    ) {
        let offer = match self.drag_offer() {
            Some(offer) => offer,
            None => return,
        };

        let usable = offer.with_mime_types(|mimes| mimes.iter().any(|m| m == URI_LIST_MIME));
        if usable {
            debug!("Drag entered at {:.0},{:.0} with a file payload", x, y);
            offer.accept_mime_type(0, Some(URI_LIST_MIME.to_string()));
            offer.set_actions(DndAction::Copy, DndAction::Copy);
            self.machine.handle(ViewEvent::DragEntered, Instant::now());
        } else {
            debug!("Drag entered without {}; not accepting", URI_LIST_MIME);
            offer.accept_mime_type(0, None);
        }
    }

    fn leave(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _data_device: &WlDataDevice) {
        debug!("Drag left");
        self.machine.handle(ViewEvent::DragLeft, Instant::now());
    }

    fn motion(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _data_device: &WlDataDevice,
        _x: f64,
        _y: f64,
    ) {
    }

    fn selection(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _data_device: &WlDataDevice,
    ) {
    }

    fn drop_performed(
        &mut self,
        conn: &Connection,
        _qh: &QueueHandle<Self>,
        _data_device: &WlDataDevice,
    ) {
        let offer = match self.drag_offer() {
            Some(offer) => offer,
            None => {
                debug!("Drop without an active offer");
                return;
            }
        };

        let mut pipe = match offer.receive(URI_LIST_MIME.to_string()) {
            Ok(pipe) => pipe,
            Err(e) => {
                warn!("Failed to receive drop payload: {:?}", e);
                return;
            }
        };

        // the receive request has to reach the source before we block on
        // the pipe; the source writes independently of our queue
        if let Err(e) = conn.flush() {
            error!("Failed to flush receive request: {}", e);
            return;
        }
        let mut raw = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut raw) {
            warn!("Failed to read drop payload: {}", e);
            return;
        }
        offer.finish();

        let payload = String::from_utf8_lossy(&raw);
        let now = Instant::now();
        match uri::first_file_uri(&payload) {
            Ok(path) => {
                // the path is only a trigger; the file is never opened
                self.machine.handle(ViewEvent::FileDropped(path), now);
            }
            Err(e) => {
                warn!("Ignoring drop: {}", e);
                self.machine.handle(ViewEvent::DragLeft, now);
            }
        }
    }
}

impl DataOfferHandler for TicketApp {
    fn source_actions(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _offer: &mut DragOffer,
        actions: DndAction,
    ) {
        debug!("Drag source offers actions: {:?}", actions);
    }

    fn selected_action(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _offer: &mut DragOffer,
        actions: DndAction,
    ) {
        debug!("Compositor selected action: {:?}", actions);
    }
}

// The view never offers data of its own; these exist for the delegate
impl DataSourceHandler for TicketApp {
    fn accept_mime(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _source: &WlDataSource,
        _mime: Option<String>,
    ) {
    }

    fn send_request(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _source: &WlDataSource,
        _mime: String,
        _fd: WritePipe,
    ) {
    }

    fn cancelled(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _source: &WlDataSource) {}

    fn dnd_dropped(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _source: &WlDataSource) {
    }

    fn dnd_finished(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _source: &WlDataSource,
    ) {
    }

    fn action(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _source: &WlDataSource,
        _action: DndAction,
    ) {
    }
}

impl ShmHandler for TicketApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for TicketApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

// Delegate macros
delegate_compositor!(TicketApp);
delegate_output!(TicketApp);
delegate_xdg_shell!(TicketApp);
delegate_xdg_window!(TicketApp);
delegate_seat!(TicketApp);
delegate_keyboard!(TicketApp);
delegate_shm!(TicketApp);
delegate_data_device!(TicketApp);
delegate_registry!(TicketApp);

/// Run the Wayland application
pub fn run(config: ViewConfig) -> Result<()> {
    info!("Connecting to Wayland display");

    let conn = Connection::connect_to_env().context("Failed to connect to Wayland display")?;

    let (globals, mut event_queue) =
        registry_queue_init(&conn).context("Failed to initialize registry")?;
    let qh = event_queue.handle();

    let compositor_state =
        CompositorState::bind(&globals, &qh).context("Failed to bind compositor")?;
    let xdg_shell = XdgShell::bind(&globals, &qh).context("Failed to bind xdg shell")?;
    let shm = Shm::bind(&globals, &qh).context("Failed to bind shm")?;
    let data_device_manager = DataDeviceManagerState::bind(&globals, &qh)
        .context("Failed to bind data device manager")?;

    // Get the display pointer for GPU presentation
    let display_ptr = conn.backend().display_ptr() as *mut std::ffi::c_void;

    let background = Background::new(config.points, &mut rand::thread_rng());
    let qr = assets::qr_code()?;
    let machine = ViewStateMachine::new(config.delay);
    let scene = Scene::new(background, qr, Instant::now());

    let mut app = TicketApp::new(
        RegistryState::new(&globals),
        SeatState::new(&globals, &qh),
        OutputState::new(&globals, &qh),
        shm,
        compositor_state,
        xdg_shell,
        data_device_manager,
        display_ptr,
        machine,
        scene,
        &config,
    );

    let surface = app.compositor_state.create_surface(&qh);
    let window = app
        .xdg_shell
        .create_window(surface, WindowDecorations::RequestServer, &qh);
    window.set_title("Ticket Drop");
    window.set_app_id("io.github.dashu041120.ticketdrop");
    window.set_min_size(Some((MIN_SIZE, MIN_SIZE)));

    // Commit the surface to trigger the first configure
    window.commit();

    app.window = Some(window);

    info!("Starting event loop");
    info!("Drop any file onto the window; press Escape or Q to quit");

    loop {
        event_queue.blocking_dispatch(&mut app)?;

        if app.should_exit {
            info!("Exiting application");
            break;
        }
    }

    Ok(())
}
