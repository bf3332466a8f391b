// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Robot descriptions shared by the unit tests.

/// UR5 arm mounted on a `world` link, with two fixed tool frames after the last wrist joint.
///
/// The limits differ from the real robot so every slot of the limits arrays is distinguishable.
/// `wrist_3_joint` declares no limits.
pub(crate) const UR5: &str = r#"
<robot name="ur5">
  <link name="world"/>
  <link name="base_link"/>
  <link name="shoulder_link"/>
  <link name="upper_arm_link"/>
  <link name="forearm_link"/>
  <link name="wrist_1_link"/>
  <link name="wrist_2_link"/>
  <link name="wrist_3_link"/>
  <link name="ee_link"/>
  <link name="tool0"/>
  <joint name="world_joint" type="fixed">
    <parent link="world"/><child link="base_link"/>
    <origin xyz="0 0 0" rpy="0 0 0"/>
  </joint>
  <joint name="shoulder_pan_joint" type="revolute">
    <parent link="base_link"/><child link="shoulder_link"/>
    <origin xyz="0 0 0.089159" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-6.0" upper="6.0" effort="150" velocity="3.15"/>
  </joint>
  <joint name="shoulder_lift_joint" type="revolute">
    <parent link="shoulder_link"/><child link="upper_arm_link"/>
    <origin xyz="0 0.13585 0" rpy="0 1.570796325 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-3.0" upper="1.0" effort="150" velocity="3.15"/>
  </joint>
  <joint name="elbow_joint" type="revolute">
    <parent link="upper_arm_link"/><child link="forearm_link"/>
    <origin xyz="0 -0.1197 0.425" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-2.8" upper="2.8" effort="150" velocity="3.15"/>
  </joint>
  <joint name="wrist_1_joint" type="revolute">
    <parent link="forearm_link"/><child link="wrist_1_link"/>
    <origin xyz="0 0 0.39225" rpy="0 1.570796325 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-4.0" upper="2.0" effort="28" velocity="3.2"/>
  </joint>
  <joint name="wrist_2_joint" type="revolute">
    <parent link="wrist_1_link"/><child link="wrist_2_link"/>
    <origin xyz="0 0.093 0" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1.0" upper="5.0" effort="28" velocity="3.2"/>
  </joint>
  <joint name="wrist_3_joint" type="revolute">
    <parent link="wrist_2_link"/><child link="wrist_3_link"/>
    <origin xyz="0 0 0.09465" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
  </joint>
  <joint name="ee_fixed_joint" type="fixed">
    <parent link="wrist_3_link"/><child link="ee_link"/>
    <origin xyz="0 0.0823 0" rpy="0 0 1.570796325"/>
  </joint>
  <joint name="wrist_3_link-tool0_fixed_joint" type="fixed">
    <parent link="wrist_3_link"/><child link="tool0"/>
    <origin xyz="0 0.0823 0" rpy="-1.570796325 0 0"/>
  </joint>
</robot>
"#;

/// Three joints rotating about Z with links along X, followed by a fixed tool.
///
/// At zero position the tool sits at (1.0, 0, 0.1).
pub(crate) const PLANAR_ARM: &str = r#"
<robot name="planar_arm">
  <link name="base"/>
  <link name="upper_arm"/>
  <link name="forearm"/>
  <link name="hand"/>
  <link name="tool"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/><child link="upper_arm"/>
    <origin xyz="0 0 0.1"/>
    <axis xyz="0 0 1"/>
    <limit lower="-2.5" upper="1.5" effort="10" velocity="2"/>
  </joint>
  <joint name="elbow" type="revolute">
    <parent link="upper_arm"/><child link="forearm"/>
    <origin xyz="0.5 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-2.0" upper="2.0" effort="10" velocity="2"/>
  </joint>
  <joint name="wrist" type="continuous">
    <parent link="forearm"/><child link="hand"/>
    <origin xyz="0.4 0 0"/>
    <axis xyz="0 0 1"/>
  </joint>
  <joint name="tool_mount" type="fixed">
    <parent link="hand"/><child link="tool"/>
    <origin xyz="0.1 0 0"/>
  </joint>
</robot>
"#;

/// A torso with two independent arms. There is no chain from one hand to the other.
pub(crate) const BRANCHED_ROBOT: &str = r#"
<robot name="branched">
  <link name="torso"/>
  <link name="left_hand"/>
  <link name="right_hand"/>
  <joint name="left_joint" type="revolute">
    <parent link="torso"/><child link="left_hand"/>
    <origin xyz="0 0.2 0"/>
    <axis xyz="1 0 0"/>
    <limit lower="-1" upper="1" effort="1" velocity="1"/>
  </joint>
  <joint name="right_joint" type="prismatic">
    <parent link="torso"/><child link="right_hand"/>
    <origin xyz="0 -0.2 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="0" upper="0.3" effort="1" velocity="1"/>
  </joint>
</robot>
"#;

/// Two unconnected trees.
pub(crate) const DISCONNECTED_ARM: &str = r#"
<robot name="disconnected">
  <link name="base"/>
  <link name="link1"/>
  <link name="floating_part"/>
  <joint name="j1" type="revolute">
    <parent link="base"/><child link="link1"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1" upper="1" effort="1" velocity="1"/>
  </joint>
</robot>
"#;
