use cortex_m::asm::nop;
use fugit::ExtU32;
use rp2040_hal::Watchdog;

pub fn restart(watchdog: &mut Watchdog) -> ! {
    // Fires almost straight away; nothing after the request should get to run.
    watchdog.start(100.micros());
    loop {
        nop();
    }
}
