use std::str::FromStr;

use thiserror::Error;

/// 对局设置，重新开局时保留
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// 将军提示开关，关闭后走子不再产生将军提示
    pub check_warning: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { check_warning: true }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{name}` expects true or false, got `{value}`")]
    BadValue { name: String, value: String },
}

impl Settings {
    /// 按名字修改一项设置，名字不区分大小写
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        match name.to_ascii_lowercase().as_str() {
            "checkwarning" => {
                self.check_warning = bool::from_str(value).map_err(|_| OptionError::BadValue {
                    name: name.to_owned(),
                    value: value.to_owned(),
                })?;
                Ok(())
            }
            _ => Err(OptionError::UnknownOption(name.to_owned())),
        }
    }
}
