/// Declares a static global `UAODV` engine protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `UAODV` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the routing engine.
///
/// # Arguments
/// - `$transport`: The concrete [`Transport`](crate::transport::Transport) type
/// - `$clock`: The concrete [`Clock`](crate::timer::Clock) type
/// - `$routes`, `$fwcache`: Optional table sizes, 8 and 16 by default
///
/// # Example
/// ```rust,ignore
/// init_uaodv!(UdpTx, SysTick);
/// ```
#[macro_export]
macro_rules! init_uaodv {
    ( $transport:ty, $clock:ty ) => {
        $crate::init_uaodv!(
            $transport,
            $clock,
            $crate::consts::UAODV_NUM_RT_ENTRIES,
            $crate::consts::UAODV_NUM_FWCACHE
        );
    };
    ( $transport:ty, $clock:ty, $routes:expr, $fwcache:expr ) => {
        pub static UAODV: $crate::timer::GlobalUaodv<$transport, $clock, { $routes }, { $fwcache }> =
            $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Initializes the global `UAODV` singleton with a new engine.
///
/// # Arguments
/// - `$transport`: The transport value
/// - `$clock`: The clock value
/// - `$config`: The engine [`Config`](crate::engine::Config)
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_uaodv!(udp, systick, Config::new(MY_ADDR, 1000));
/// }
/// ```
///
/// # Notes
/// - Requires `init_uaodv!` to have been used earlier in the same module.
#[macro_export]
macro_rules! setup_uaodv {
    ( $transport:expr, $clock:expr, $config:expr ) => {
        $crate::timer::global_uaodv_setup(&UAODV, $transport, $clock, $config)
    };
}

/// Calls `on_timer_tick()` on the global `UAODV` if it has been initialized.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_uaodv!();
/// }
/// ```
///
/// # Notes
/// - This macro assumes `UAODV` was declared with `init_uaodv!`
///   and initialized via `setup_uaodv!`.
/// - Safe to call before setup; it does nothing until the engine exists.
#[macro_export]
macro_rules! tick_uaodv {
    () => {
        $crate::timer::global_uaodv_timer_tick(&UAODV)
    };
}
