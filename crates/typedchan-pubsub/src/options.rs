use typedchan_naming::Separator;

/// Options shared by the subscribing and publishing facades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelOptions {
    /// Character between channel kind and instance id in wire names.
    pub separator: Separator,
    /// Validate payloads on the publish path too.
    ///
    /// Off by default: typed publishes are checked at compile time.
    pub validate_outbound: bool,
}
