//! 配置校验模块
//!
//! 校验规则：
//! - 参数范围 min <= default <= max，且为有限值
//! - 文件名模板只使用已知占位符
//! - 保存数量 >= 1
//! - mock 相机位深 1..=16，尺寸非零，序列号互不相同
//! - 节点脚本条目合法

use contracts::{
    AccessMode, CameraParameter, CameraSide, ContractError, NodeOp, NodeScript, PanelBlueprint,
    MAX_BITS_PER_PIXEL, NAME_PLACEHOLDERS,
};

/// 校验 PanelBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PanelBlueprint) -> Result<(), ContractError> {
    validate_parameters(blueprint)?;
    validate_capture(blueprint)?;
    validate_mock_cameras(blueprint)?;
    Ok(())
}

/// 校验参数滑块范围
fn validate_parameters(blueprint: &PanelBlueprint) -> Result<(), ContractError> {
    for parameter in CameraParameter::ALL {
        let range = blueprint.parameters.range(parameter);
        let field = format!("parameters.{parameter}");

        if !(range.min.is_finite() && range.max.is_finite() && range.default.is_finite()) {
            return Err(ContractError::config_validation(
                field,
                "min, max and default must be finite",
            ));
        }
        if range.min > range.max {
            return Err(ContractError::config_validation(
                field,
                format!("min ({}) must be <= max ({})", range.min, range.max),
            ));
        }
        if range.default < range.min || range.default > range.max {
            return Err(ContractError::config_validation(
                field,
                format!(
                    "default ({}) must lie within [{}, {}]",
                    range.default, range.min, range.max
                ),
            ));
        }
    }
    Ok(())
}

/// 校验保存设置
fn validate_capture(blueprint: &PanelBlueprint) -> Result<(), ContractError> {
    let capture = &blueprint.capture;

    if capture.count == 0 {
        return Err(ContractError::config_validation(
            "capture.count",
            "count must be >= 1",
        ));
    }

    validate_name_format(&capture.name_format)
}

/// 校验文件名模板中的占位符
pub fn validate_name_format(name_format: &str) -> Result<(), ContractError> {
    if name_format.trim().is_empty() {
        return Err(ContractError::config_validation(
            "capture.name_format",
            "name format cannot be empty",
        ));
    }

    let mut rest = name_format;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(ContractError::config_validation(
                "capture.name_format",
                "unmatched '}'",
            ));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ContractError::config_validation("capture.name_format", "unmatched '{'")
        })?;
        let placeholder = &after[..close];
        if !NAME_PLACEHOLDERS.contains(&placeholder) {
            return Err(ContractError::config_validation(
                "capture.name_format",
                format!(
                    "unknown placeholder '{{{placeholder}}}', expected one of {NAME_PLACEHOLDERS:?}"
                ),
            ));
        }
        rest = &after[close + 1..];
    }
    Ok(())
}

/// 校验 mock 相机设置
fn validate_mock_cameras(blueprint: &PanelBlueprint) -> Result<(), ContractError> {
    for side in CameraSide::BOTH {
        let mock = &blueprint.camera(side).mock;
        let field = format!("cameras.{side}.mock");

        if mock.serial.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("{field}.serial"),
                "serial cannot be empty",
            ));
        }
        if mock.bits_per_pixel == 0 || mock.bits_per_pixel > MAX_BITS_PER_PIXEL {
            return Err(ContractError::config_validation(
                format!("{field}.bits_per_pixel"),
                format!(
                    "bits_per_pixel must be in 1..={MAX_BITS_PER_PIXEL}, got {}",
                    mock.bits_per_pixel
                ),
            ));
        }
        if mock.width == 0 || mock.height == 0 {
            return Err(ContractError::config_validation(
                format!("{field}.width/height"),
                "image dimensions must be > 0",
            ));
        }
        if mock.incomplete_every == Some(0) {
            return Err(ContractError::config_validation(
                format!("{field}.incomplete_every"),
                "incomplete_every must be >= 1 when set",
            ));
        }
    }

    if blueprint.cameras.primary.mock.serial == blueprint.cameras.secondary.mock.serial {
        return Err(ContractError::config_validation(
            "cameras.secondary.mock.serial",
            format!(
                "duplicate serial '{}' shared by both cameras",
                blueprint.cameras.primary.mock.serial
            ),
        ));
    }
    Ok(())
}

/// 校验节点脚本
pub fn validate_node_script(script: &NodeScript) -> Result<(), ContractError> {
    for (index, command) in script.commands.iter().enumerate() {
        if command.node.trim().is_empty() {
            return Err(ContractError::node_script(
                index,
                &command.node,
                "node name cannot be empty",
            ));
        }
        if command.node.split('.').any(str::is_empty) {
            return Err(ContractError::node_script(
                index,
                &command.node,
                "node path contains an empty segment",
            ));
        }
        if command.op() == NodeOp::SetValue && command.required_access() != AccessMode::ReadWrite {
            return Err(ContractError::node_script(
                index,
                &command.node,
                format!(
                    "SetValue requires RW access, got {}",
                    command.required_access()
                ),
            ));
        }
        if command.op() == NodeOp::Execute && command.required_access() == AccessMode::ReadOnly {
            return Err(ContractError::node_script(
                index,
                &command.node,
                "Execute cannot target a read-only node",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{NodeCommand, NodeValue};

    #[test]
    fn test_default_blueprint_is_valid() {
        assert!(validate(&PanelBlueprint::default()).is_ok());
    }

    #[test]
    fn test_parameter_default_out_of_range() {
        let mut bp = PanelBlueprint::default();
        bp.parameters.gain.default = 100.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("parameters.gain"));
    }

    #[test]
    fn test_parameter_min_above_max() {
        let mut bp = PanelBlueprint::default();
        bp.parameters.fps.min = 90.0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_name_format_placeholders() {
        assert!(validate_name_format("{serial}_{datetime}_{counter}_{L_R}").is_ok());
        assert!(validate_name_format("plain").is_ok());
        assert!(validate_name_format("{serial}_{frame}").is_err());
        assert!(validate_name_format("{serial").is_err());
        assert!(validate_name_format("serial}").is_err());
        assert!(validate_name_format("  ").is_err());
    }

    #[test]
    fn test_duplicate_serials() {
        let mut bp = PanelBlueprint::default();
        bp.cameras.secondary.mock.serial = bp.cameras.primary.mock.serial.clone();
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_bits_per_pixel_bounds() {
        let mut bp = PanelBlueprint::default();
        bp.cameras.primary.mock.bits_per_pixel = 17;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut bp = PanelBlueprint::default();
        bp.capture.count = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_node_script_access_rules() {
        let mut set = NodeCommand::set("TriggerMode", NodeValue::enum_entry("On"));
        let ok = NodeScript {
            commands: vec![NodeCommand::execute("UserSetLoad"), set.clone()],
        };
        assert!(validate_node_script(&ok).is_ok());

        set.access = Some(AccessMode::ReadOnly);
        let bad = NodeScript {
            commands: vec![set],
        };
        assert!(validate_node_script(&bad).is_err());

        let empty = NodeScript {
            commands: vec![NodeCommand::execute("TLStream..Mode")],
        };
        assert!(validate_node_script(&empty).is_err());
    }
}
