/// Request codes a client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RequestCode {
    Register = 600,
    ListClients = 601,
    GetPublicKey = 602,
    SendMessage = 603,
    FetchMessages = 604,
}

impl RequestCode {
    /// Map a raw wire code to a known request. Unknown codes return `None`
    /// so the dispatcher can answer with a descriptive error instead of
    /// guessing.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            600 => Some(Self::Register),
            601 => Some(Self::ListClients),
            602 => Some(Self::GetPublicKey),
            603 => Some(Self::SendMessage),
            604 => Some(Self::FetchMessages),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Response codes the relay can answer with. Every request gets exactly one
/// of these; `Error` carries descriptive text as its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResponseCode {
    RegisterOk = 2100,
    ClientList = 2101,
    PublicKey = 2102,
    MessageQueued = 2103,
    Messages = 2104,
    Error = 9000,
}

impl ResponseCode {
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            2100 => Some(Self::RegisterOk),
            2101 => Some(Self::ClientList),
            2102 => Some(Self::PublicKey),
            2103 => Some(Self::MessageQueued),
            2104 => Some(Self::Messages),
            9000 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
