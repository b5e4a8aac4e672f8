#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, UART0, UART1};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use flight_rp2040::{
    FlightConfig, FlightController, ImuOffsets, ImuSample, ImuSource, LinkPort, Mpu6050,
    TimedSink,
};
use link_proto::{LinkReply, LinkRequest};
use static_cell::StaticCell;

#[cfg(feature = "esc-pca9685")]
use flight_rp2040::Pca9685Output;
#[cfg(feature = "esc-uart")]
use {embassy_rp::uart::UartTx, flight_rp2040::UartEscOutput};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
});

/// Depth of the request/reply channels. The link runs in lockstep, so one
/// slot would do; a little slack keeps the link task from stalling while
/// the core finishes an actuator write.
const LINK_QUEUE_DEPTH: usize = 4;

/// Upper bound on one actuator write. A four-rotor PCA9685 update is
/// ~25 bytes of I2C traffic, well under a millisecond at 100 kHz; a
/// write still pending after this long means a wedged bus, and the
/// watchdog deadline must not wait behind it.
const ACTUATOR_WRITE_TIMEOUT: Duration = Duration::from_millis(10);

/// Hardware sensor trim for this airframe ("Maggie").
const IMU_TRIM: ImuOffsets = ImuOffsets {
    accel: [-4378, 1255, 1648],
    gyro: [0, 0, 0],
};

type I2cBus = Mutex<NoopRawMutex, I2c<'static, i2c::Async>>;
type SharedI2c = I2cDevice<'static, NoopRawMutex, I2c<'static, i2c::Async>>;

#[cfg(feature = "esc-pca9685")]
type EscSink = TimedSink<Pca9685Output<SharedI2c>>;
#[cfg(feature = "esc-uart")]
type EscSink = TimedSink<UartEscOutput<'static>>;

/// Requests from the link task to the core.
/// A bounded channel: the link task blocks instead of dropping commands.
static REQUESTS: StaticCell<Channel<CriticalSectionRawMutex, LinkRequest, LINK_QUEUE_DEPTH>> =
    StaticCell::new();

/// Replies from the core back to the link task, in lockstep.
static REPLIES: StaticCell<Channel<CriticalSectionRawMutex, LinkReply, LINK_QUEUE_DEPTH>> =
    StaticCell::new();

/// Signal for passing inertial samples to the core.
/// Using Signal instead of Channel provides "latest value wins" semantics,
/// which is appropriate here since only the most recent attitude matters.
static SAMPLES: StaticCell<Signal<CriticalSectionRawMutex, ImuSample>> = StaticCell::new();

/// Shared I2C bus for the MPU-6050 and the PCA9685.
static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Flight controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());
    let config = FlightConfig::default();

    let requests = REQUESTS.init(Channel::new());
    let replies = REPLIES.init(Channel::new());
    let samples = SAMPLES.init(Signal::new());

    // --- Command link UART ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();
    let link = LinkPort::new(rx, tx);

    // --- Shared I2C bus ---
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c::Config::default());
    let bus = I2C_BUS.init(Mutex::new(i2c));

    // --- Inertial sensor ---
    let mut imu = Mpu6050::new(I2cDevice::new(bus));
    if let Err(e) = imu.init(&IMU_TRIM).await {
        // The core keeps flying unstabilized; reads keep failing and
        // every cycle is skipped
        error!("IMU init failed: {:?}", e);
    }

    // --- Rotor output ---
    #[cfg(feature = "esc-pca9685")]
    let sink = {
        let mut sink = Pca9685Output::new(I2cDevice::new(bus));
        if let Err(e) = sink.init().await {
            error!("PWM driver init failed: {:?}", e);
        }
        sink
    };

    #[cfg(feature = "esc-uart")]
    let sink = {
        let mut esc_config = UartConfig::default();
        esc_config.baudrate = 115_200;
        let tx = UartTx::new(p.UART0, p.PIN_0, p.DMA_CH2, esc_config);
        UartEscOutput::new(tx)
    };

    // Bound every write; the sink shares the I2C bus with the sensor
    let sink = TimedSink::new(sink, ACTUATOR_WRITE_TIMEOUT);

    // Default window sizes are valid, so this cannot fail
    let controller =
        FlightController::new(config, sink, Instant::now().as_millis()).unwrap();

    spawner.spawn(link_task(link, requests, replies)).unwrap();
    spawner
        .spawn(imu_task(imu, samples, config.sensor_period_ms))
        .unwrap();
    spawner
        .spawn(core_task(controller, requests, replies, samples))
        .unwrap();

    info!("Flight controller initialized, listening for commands...");
}

/// Link task - lockstep request/reply bridge between UART and the core.
#[embassy_executor::task]
async fn link_task(
    mut port: LinkPort<'static>,
    requests: &'static Channel<CriticalSectionRawMutex, LinkRequest, LINK_QUEUE_DEPTH>,
    replies: &'static Channel<CriticalSectionRawMutex, LinkReply, LINK_QUEUE_DEPTH>,
) {
    loop {
        match port.receive().await {
            Ok(request) => {
                requests.send(request).await;
                let reply = replies.receive().await;
                if let Err(e) = port.send(&reply).await {
                    error!("Link reply failed: {:?}", e);
                }
            }
            Err(e) => {
                // A corrupt line must never become a command; drop it and
                // keep listening
                error!("Link receive error: {:?}", e);
            }
        }
    }
}

/// IMU task - samples on a fixed ticker and signals the latest reading.
#[embassy_executor::task]
async fn imu_task(
    mut imu: Mpu6050<SharedI2c>,
    samples: &'static Signal<CriticalSectionRawMutex, ImuSample>,
    period_ms: u64,
) {
    let mut ticker = Ticker::every(Duration::from_millis(period_ms));
    loop {
        ticker.next().await;
        match imu.sample().await {
            Ok(sample) => samples.signal(sample),
            Err(e) => {
                // Skip the cycle; smoothing and bias hold their last values
                error!("IMU read failed: {:?}", e);
            }
        }
    }
}

/// The three event sources of one control-loop iteration.
enum Event {
    Request(LinkRequest),
    Sample(ImuSample),
    Deadline,
}

/// Core task - owns the controller and serializes all mutation.
#[embassy_executor::task]
async fn core_task(
    mut controller: FlightController<EscSink>,
    requests: &'static Channel<CriticalSectionRawMutex, LinkRequest, LINK_QUEUE_DEPTH>,
    replies: &'static Channel<CriticalSectionRawMutex, LinkReply, LINK_QUEUE_DEPTH>,
    samples: &'static Signal<CriticalSectionRawMutex, ImuSample>,
) {
    loop {
        let event = match controller.watchdog_deadline_ms() {
            Some(deadline_ms) => {
                let deadline = Timer::at(Instant::from_millis(deadline_ms));
                match select3(requests.receive(), samples.wait(), deadline).await {
                    Either3::First(request) => Event::Request(request),
                    Either3::Second(sample) => Event::Sample(sample),
                    Either3::Third(()) => Event::Deadline,
                }
            }
            // Link already lost: nothing left to time out against
            None => match select(requests.receive(), samples.wait()).await {
                Either::First(request) => Event::Request(request),
                Either::Second(sample) => Event::Sample(sample),
            },
        };

        match event {
            Event::Request(request) => {
                let reply = handle_request(&mut controller, request).await;
                replies.send(reply).await;
            }
            Event::Sample(sample) => {
                if let Err(e) = controller.ingest_sample(&sample).await {
                    error!("Actuator write failed: {:?}", e);
                }
            }
            Event::Deadline => {
                match controller
                    .handle_link_deadline(Instant::now().as_millis())
                    .await
                {
                    Ok(true) => warn!("Command link lost, holding level hover"),
                    Ok(false) => {}
                    Err(e) => error!("Actuator write failed during failsafe: {:?}", e),
                }
            }
        }
    }
}

/// Evaluate one request against the controller.
async fn handle_request(
    controller: &mut FlightController<EscSink>,
    request: LinkRequest,
) -> LinkReply {
    match request {
        LinkRequest::Command { axis, value } => {
            let now = Instant::now().as_millis();
            match controller.apply_command(axis, value, now).await {
                Ok(()) => LinkReply::Ack(true),
                Err(e) if e.committed() => {
                    // The command is in effect; the write is retried on
                    // the next cycle
                    error!("Actuator write failed: {:?}", e);
                    LinkReply::Ack(true)
                }
                Err(_) => LinkReply::Ack(false),
            }
        }
        LinkRequest::Ping => {
            controller.note_liveness(Instant::now().as_millis());
            LinkReply::Ack(true)
        }
        LinkRequest::StateQuery => LinkReply::State(controller.control_state()),
    }
}
