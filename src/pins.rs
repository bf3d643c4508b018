//! GPIO / peripheral pin assignments for the GasGuard reference board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// MQ-2 gas sensor analog output.
/// ADC2 channel 4 on the ESP32-S3 (GPIO 15).
pub const MQ2_ADC_GPIO: i32 = 15;
/// ADC channel number for [`MQ2_ADC_GPIO`].
pub const MQ2_ADC_CHANNEL: u32 = 4;

/// DHT11 single-wire data line (open-drain, external pull-up).
pub const DHT11_GPIO: i32 = 42;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Active buzzer, HIGH = sounding.
pub const BUZZER_GPIO: i32 = 14;

/// Exhaust fan relay, HIGH = fan running.
pub const FAN_RELAY_GPIO: i32 = 39;

/// SG90-class servo driving the gas-supply ball valve (LEDC PWM).
pub const VALVE_SERVO_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// User button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button for cooking / non-cooking mode.
pub const BUTTON_GPIO: i32 = 38;

// ---------------------------------------------------------------------------
// Servo PWM configuration
// ---------------------------------------------------------------------------

/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution for the servo channel.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width at 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2400;

/// Servo angle with the valve open.
pub const VALVE_OPEN_DEG: u8 = 0;
/// Servo angle with the valve closed.
pub const VALVE_CLOSED_DEG: u8 = 90;
