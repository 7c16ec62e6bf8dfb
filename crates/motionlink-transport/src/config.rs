//! 输入源配置

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// 默认 UDP 端口
pub const DEFAULT_UDP_PORT: u16 = 8889;

/// 默认串口波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// 默认串口读超时
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// 支持的标准波特率
pub const STANDARD_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 28800, 38400,
    57600, 76800, 115200, 230400, 460800, 576000, 921600,
];

/// 波特率是否在标准列表中
pub fn is_standard_baud_rate(baud_rate: u32) -> bool {
    STANDARD_BAUD_RATES.contains(&baud_rate)
}

/// UDP 监听地址范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressScope {
    /// 仅本机（127.0.0.1）
    #[default]
    Loopback,
    /// 所有网卡（0.0.0.0）
    Any,
}

impl AddressScope {
    pub fn ip(self) -> IpAddr {
        match self {
            AddressScope::Loopback => IpAddr::V4(Ipv4Addr::LOCALHOST),
            AddressScope::Any => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressScope::Loopback => "loopback",
            AddressScope::Any => "any",
        }
    }
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "loopback" | "localhost" => Ok(AddressScope::Loopback),
            "any" | "all" => Ok(AddressScope::Any),
            other => Err(format!(
                "Unknown address scope '{other}' (expected 'loopback' or 'any')"
            )),
        }
    }
}

/// UDP 输入源配置
///
/// # 示例
///
/// ```
/// use motionlink_transport::{AddressScope, UdpConfig};
///
/// let config = UdpConfig::default().port(9000).scope(AddressScope::Any);
/// assert_eq!(config.bind_addr().to_string(), "0.0.0.0:9000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// 监听端口（0 表示由系统分配）
    pub port: u16,
    /// 监听地址范围
    pub scope: AddressScope,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_UDP_PORT,
            scope: AddressScope::Loopback,
        }
    }
}

impl UdpConfig {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scope(mut self, scope: AddressScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.scope.ip(), self.port)
    }
}

/// 串口输入源配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// 串口名（如 `/dev/ttyUSB0`、`COM3`）
    pub port_name: String,
    /// 波特率（必须在 [`STANDARD_BAUD_RATES`] 中）
    pub baud_rate: u32,
    /// 读超时，超时视为"本轮无数据"
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl SerialConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// 校验波特率和读超时（不检查串口是否存在）
    pub fn validate(&self) -> Result<(), crate::TransportError> {
        if !is_standard_baud_rate(self.baud_rate) {
            return Err(crate::TransportError::Config(format!(
                "baud rate {} is not a standard rate",
                self.baud_rate
            )));
        }
        if self.read_timeout.is_zero() {
            return Err(crate::TransportError::Config(
                "read timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
