use derive_more::Display;

/// Independently scheduled category of device data.
#[derive(Debug, Display, enumset::EnumSetType)]
pub enum Group {
    #[display("real-time variables")]
    Variables,

    #[display("device detail")]
    DeviceDetail,

    #[display("battery settings")]
    BatterySettings,

    #[display("daily report")]
    DailyReport,
}
