use crate::engine::{Config, Uaodv};
use crate::timer::Clock;
use crate::transport::Transport;
use core::cell::RefCell;
use critical_section::Mutex;

/// A routing engine shared between the main loop and interrupt handlers.
pub type GlobalUaodv<T, C, const ROUTES: usize, const FWCACHE: usize> =
    Mutex<RefCell<Option<Uaodv<T, C, ROUTES, FWCACHE>>>>;

/// Used to initialize the global static `Uaodv` engine for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use uaodv::timer::{GlobalUaodv, global_uaodv_init};
///
/// static UAODV: GlobalUaodv<UdpTx, SysTick, 8, 16> = global_uaodv_init();
/// ```
pub const fn global_uaodv_init<T, C, const ROUTES: usize, const FWCACHE: usize>()
-> GlobalUaodv<T, C, ROUTES, FWCACHE>
where
    T: Transport,
    C: Clock,
{
    Mutex::new(RefCell::new(None))
}

/// Builds the engine and stores it in the global slot, replacing any previous one.
///
/// # Arguments
/// * The global static `Uaodv`
/// * The transport control messages are sent on
/// * The tick source, which should be the same timer that fires the ISR
/// * The engine configuration
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     global_uaodv_setup(&UAODV, udp, systick, Config::new(MY_ADDR, 1000));
/// }
/// ```
pub fn global_uaodv_setup<T, C, const ROUTES: usize, const FWCACHE: usize>(
    global_uaodv: &'static GlobalUaodv<T, C, ROUTES, FWCACHE>,
    transport: T,
    clock: C,
    config: Config,
) where
    T: Transport,
    C: Clock,
{
    critical_section::with(|cs| {
        let _ = global_uaodv
            .borrow(cs)
            .replace(Some(Uaodv::new(transport, clock, config)));
    });
}

/// Runs the engine's timer tick at each interrupt
///
/// # Arguments
/// * The global static `Uaodv`
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     global_uaodv_timer_tick(&UAODV);
/// }
/// ```
pub fn global_uaodv_timer_tick<T, C, const ROUTES: usize, const FWCACHE: usize>(
    global_uaodv: &'static GlobalUaodv<T, C, ROUTES, FWCACHE>,
) where
    T: Transport,
    C: Clock,
{
    critical_section::with(|cs| {
        if let Some(uaodv) = global_uaodv.borrow(cs).borrow_mut().as_mut() {
            uaodv.on_timer_tick();
        }
    });
}

/// Runs `f` on the global engine inside a critical section.
///
/// # Returns
/// * `None` if the engine has not been set up yet, otherwise whatever `f` returns
///
/// # Example
/// ```rust,ignore
/// let route = with_global_uaodv(&UAODV, |uaodv| uaodv.request_route_to(peer));
/// ```
pub fn with_global_uaodv<T, C, R, F, const ROUTES: usize, const FWCACHE: usize>(
    global_uaodv: &'static GlobalUaodv<T, C, ROUTES, FWCACHE>,
    f: F,
) -> Option<R>
where
    T: Transport,
    C: Clock,
    F: FnOnce(&mut Uaodv<T, C, ROUTES, FWCACHE>) -> R,
{
    critical_section::with(|cs| global_uaodv.borrow(cs).borrow_mut().as_mut().map(f))
}
