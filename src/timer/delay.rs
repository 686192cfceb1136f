use crate::engine::Uaodv;
use crate::timer::Clock;
use crate::transport::Transport;
use embedded_hal::delay::DelayNs;

/// Runs one round of the blocking loop: a timer tick followed by a delay.
///
/// # Arguments
/// - `uaodv`: the routing engine
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL
/// - `tick_us`: how long to sleep after the tick, in microseconds
pub fn step_uaodv<T, C, D, const ROUTES: usize, const FWCACHE: usize>(
    uaodv: &mut Uaodv<T, C, ROUTES, FWCACHE>,
    delay: &mut D,
    tick_us: u32,
) where
    T: Transport,
    C: Clock,
    D: DelayNs,
{
    uaodv.on_timer_tick();
    delay.delay_us(tick_us);
}

/// Runs a blocking loop that repeatedly calls `on_timer_tick()` on the engine.
///
/// This is a simple timing loop for use in environments where interrupts are unavailable
/// or undesired. Pending route requests and route errors go out from here once their
/// poll delay has passed.
///
/// # Arguments
/// - `uaodv`: the routing engine
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL
/// - `tick_us`: the delay between each tick call, in microseconds
///
/// # Example
/// ```rust,ignore
/// use uaodv::timer::run_uaodv_loop;
///
/// let mut uaodv: Uaodv<_, _> = Uaodv::new(udp, clock, config);
/// run_uaodv_loop(&mut uaodv, &mut delay, 1_000);
/// ```
///
/// # Notes
/// - This loop will never return; it is intended for single-purpose polling firmware.
/// - Received datagrams must be fed from an interrupt or another core; prefer
///   [`step_uaodv`] in a hand-written loop otherwise.
pub fn run_uaodv_loop<T, C, D, const ROUTES: usize, const FWCACHE: usize>(
    uaodv: &mut Uaodv<T, C, ROUTES, FWCACHE>,
    delay: &mut D,
    tick_us: u32,
) -> !
where
    T: Transport,
    C: Clock,
    D: DelayNs,
{
    loop {
        step_uaodv(uaodv, delay, tick_us);
    }
}
