//! 二维码弹窗：显示状态和分享地址的二维码

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use anyhow::Result;
use qrcode::{Color, QrCode};
use reqwest::Url;

/// 静区宽度（模块数）
const QUIET_ZONE: usize = 4;

/// 点击事件的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// 遮罩层本身
    Backdrop,
    /// 弹窗内容
    Content,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QrModal {
    visible: bool,
}

impl QrModal {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// 只有点在遮罩上才关闭
    pub fn handle_click(&mut self, target: ClickTarget) {
        if self.visible && target == ClickTarget::Backdrop {
            self.hide();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// 分享地址：服务器地址是回环地址时换成本机局域网 IP，方便手机扫码访问
pub fn share_url(base: &Url) -> Url {
    share_url_with(base, get_local_ip())
}

fn share_url_with(base: &Url, lan_ip: Option<Ipv4Addr>) -> Url {
    let loopback = match base.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback() || ip.is_unspecified())
            .unwrap_or(false),
        None => false,
    };

    let mut url = base.clone();
    if let (true, Some(ip)) = (loopback, lan_ip) {
        if url.set_ip_host(IpAddr::V4(ip)).is_err() {
            tracing::debug!(%base, "cannot replace host, sharing as-is");
            return base.clone();
        }
    }
    url
}

// 获取本地IP地址
fn get_local_ip() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?; // 不会真的发包，只用来选出口网卡

    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ipv4) if !ipv4.is_loopback() && ipv4 != Ipv4Addr::UNSPECIFIED => Some(ipv4),
        _ => None,
    }
}

/// 用 Unicode 半块字符在终端里画二维码，每行字符对应两行模块
pub fn render_terminal_qr(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes())?;
    let width = code.width();
    let modules = code.to_colors();
    let height = modules.len() / width;

    let dark = |row: usize, col: usize| -> bool {
        row < height && modules[row * width + col] == Color::Dark
    };

    let full_width = width + QUIET_ZONE * 2;
    let blank = " ".repeat(full_width);
    let margin = " ".repeat(QUIET_ZONE);

    let mut output = String::new();
    for _ in 0..QUIET_ZONE / 2 {
        output.push_str(&blank);
        output.push('\n');
    }

    for row in (0..height).step_by(2) {
        output.push_str(&margin);
        for col in 0..width {
            let ch = match (dark(row, col), dark(row + 1, col)) {
                (true, true) => '\u{2588}',
                (true, false) => '\u{2580}',
                (false, true) => '\u{2584}',
                (false, false) => ' ',
            };
            output.push(ch);
        }
        output.push_str(&margin);
        output.push('\n');
    }

    for _ in 0..QUIET_ZONE / 2 {
        output.push_str(&blank);
        output.push('\n');
    }

    Ok(output)
}
