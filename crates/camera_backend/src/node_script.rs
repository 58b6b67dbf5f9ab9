//! Node script execution

use contracts::NodeScript;
use tracing::{debug, info};

use crate::backend::CameraBackend;
use crate::error::Result;

/// Run every command of `script` in order, stopping at the first failure
///
/// Returns the number of commands executed.
pub fn apply_node_script<B: CameraBackend + ?Sized>(
    camera: &mut B,
    script: &NodeScript,
) -> Result<usize> {
    for command in &script.commands {
        debug!(
            node = %command.node,
            op = ?command.op(),
            access = %command.required_access(),
            value = ?command.value,
            "Executing node command"
        );
        camera.set_node(
            &command.node,
            command.op(),
            command.required_access(),
            command.value.as_ref(),
        )?;
    }
    info!(commands = script.commands.len(), "Node script applied");
    Ok(script.commands.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_camera::{CallLog, MockCamera, MockOp};
    use contracts::{MockCameraSettings, NodeCommand, NodeValue};

    fn ready_camera() -> MockCamera {
        let mut camera = MockCamera::new(
            "primary",
            MockCameraSettings::with_serial("1"),
            CallLog::default(),
        );
        camera.find("1").unwrap();
        camera.init("1").unwrap();
        camera
    }

    #[test]
    fn test_script_runs_in_order() {
        let mut camera = ready_camera();
        let script = NodeScript {
            commands: vec![
                NodeCommand::set("UserSetSelector", NodeValue::enum_entry("Default")),
                NodeCommand::execute("UserSetLoad"),
                NodeCommand::set("TriggerMode", NodeValue::enum_entry("On")),
            ],
        };
        assert_eq!(apply_node_script(&mut camera, &script).unwrap(), 3);
        assert_eq!(
            camera.handle().node_value("TriggerMode"),
            Some(NodeValue::enum_entry("On"))
        );
        let set_calls = camera
            .log()
            .entries()
            .iter()
            .filter(|c| c.op == MockOp::SetNode)
            .count();
        assert_eq!(set_calls, 3);
    }

    #[test]
    fn test_script_stops_at_first_failure() {
        let mut camera = ready_camera();
        let script = NodeScript {
            commands: vec![
                // read-only node cannot be written
                NodeCommand::set("TLDevice.DeviceSerialNumber", NodeValue::Int(5)),
                NodeCommand::set("TriggerMode", NodeValue::enum_entry("On")),
            ],
        };
        assert!(apply_node_script(&mut camera, &script).is_err());
        assert_eq!(
            camera.handle().node_value("TriggerMode"),
            Some(NodeValue::enum_entry("Off"))
        );
    }
}
