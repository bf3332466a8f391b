// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use nalgebra::{DMatrix, DVector, Isometry3, Translation3, UnitQuaternion, Vector3, SVD};

use crate::chain::{ChainJoint, JointChain};
use crate::kinematics::{FrameVel, IkStatus, Twist, VelocityKinematics};
use crate::utils::JntArray;

/// Recursive forward kinematics and SVD based pseudo-inverse velocity kinematics for a
/// [`JointChain`].
///
/// The Jacobian uses the tip as reference point and is expressed in the root frame. Jacobian
/// and tip pose are kept for the last joint positions, so solving and evaluating the feedback
/// at the same positions runs the forward recursion once.
///
/// # Panics
/// All [`VelocityKinematics`] methods panic if a joint vector does not have
/// [`num_joints`](`VelocityKinematics::num_joints`) entries.
pub struct ChainSolvers {
    chain: JointChain,
    epsilon: f64,
    max_iterations: usize,
    jacobian: DMatrix<f64>,
    twist: DVector<f64>,
    origins: Vec<Vector3<f64>>,
    axes: Vec<Vector3<f64>>,
    // positions the jacobian and tip pose were computed for
    cached_q: JntArray,
    cached_tip: Isometry3<f64>,
    cache_valid: bool,
}

impl ChainSolvers {
    /// Default threshold below which a singular value is treated as zero.
    pub const DEFAULT_EPSILON: f64 = 1e-5;
    /// Default iteration bound of the SVD.
    pub const DEFAULT_MAX_ITERATIONS: usize = 150;

    /// Creates the solvers for a chain.
    ///
    /// # Arguments
    /// * `chain` - Chain the solvers are bound to.
    /// * `epsilon` - Singular values below this threshold are dropped from the pseudo-inverse
    /// and make the solution [`Degenerate`](`IkStatus::Degenerate`).
    /// * `max_iterations` - Iteration bound of the SVD. 0 means no bound.
    pub fn new(chain: JointChain, epsilon: f64, max_iterations: usize) -> Self {
        let n = chain.num_joints();
        ChainSolvers {
            chain,
            epsilon,
            max_iterations,
            jacobian: DMatrix::zeros(6, n),
            twist: DVector::zeros(6),
            origins: vec![Vector3::zeros(); n],
            axes: vec![Vector3::zeros(); n],
            cached_q: JntArray::zeros(n),
            cached_tip: Isometry3::identity(),
            cache_valid: false,
        }
    }

    /// Creates the solvers with [`DEFAULT_EPSILON`](`Self::DEFAULT_EPSILON`) and
    /// [`DEFAULT_MAX_ITERATIONS`](`Self::DEFAULT_MAX_ITERATIONS`).
    pub fn with_defaults(chain: JointChain) -> Self {
        ChainSolvers::new(
            chain,
            ChainSolvers::DEFAULT_EPSILON,
            ChainSolvers::DEFAULT_MAX_ITERATIONS,
        )
    }

    pub fn chain(&self) -> &JointChain {
        &self.chain
    }

    /// Computes the Jacobian at `q` into the internal buffer and returns the tip pose. Does
    /// nothing but return the cached pose if `q` did not change since the last call.
    fn update_jacobian(&mut self, q: &JntArray) -> Isometry3<f64> {
        assert_eq!(q.len(), self.chain.num_joints());
        if self.cache_valid && self.cached_q == *q {
            return self.cached_tip;
        }
        let mut transform = Isometry3::identity();
        for (i, (joint, &position)) in self.chain.joints().iter().zip(q.iter()).enumerate() {
            transform *= joint.origin;
            self.origins[i] = transform.translation.vector;
            self.axes[i] = transform.rotation * joint.axis.into_inner();
            transform *= joint_motion(joint, position);
        }
        let tip = transform * self.chain.tip_offset();
        let tip_position = tip.translation.vector;

        for (i, joint) in self.chain.joints().iter().enumerate() {
            let axis = self.axes[i];
            let (linear, angular) = if joint.prismatic {
                (axis, Vector3::zeros())
            } else {
                (axis.cross(&(tip_position - self.origins[i])), axis)
            };
            self.jacobian
                .fixed_view_mut::<3, 1>(0, i)
                .copy_from(&linear);
            self.jacobian
                .fixed_view_mut::<3, 1>(3, i)
                .copy_from(&angular);
        }
        self.cached_q.copy_from(q);
        self.cached_tip = tip;
        self.cache_valid = true;
        tip
    }
}

fn joint_motion(joint: &ChainJoint, position: f64) -> Isometry3<f64> {
    if joint.prismatic {
        Isometry3::from_parts(
            Translation3::from(joint.axis.into_inner() * position),
            UnitQuaternion::identity(),
        )
    } else {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&joint.axis, position),
        )
    }
}

impl VelocityKinematics for ChainSolvers {
    fn num_joints(&self) -> usize {
        self.chain.num_joints()
    }

    fn inverse_velocity(&mut self, q: &JntArray, twist: &Twist, qdot: &mut JntArray) -> IkStatus {
        assert_eq!(qdot.len(), self.chain.num_joints());
        if self.chain.num_joints() == 0 {
            return IkStatus::Degenerate;
        }
        self.update_jacobian(q);
        self.twist.copy_from(&twist.to_vector());

        // the decomposition consumes its input and allocates its factors
        let svd = match SVD::try_new(
            self.jacobian.clone(),
            true,
            true,
            f64::EPSILON,
            self.max_iterations,
        ) {
            Some(svd) => svd,
            None => {
                qdot.fill(0.);
                return IkStatus::Degenerate;
            }
        };
        let degenerate = svd.singular_values.iter().any(|&s| s < self.epsilon);
        match svd.solve(&self.twist, self.epsilon) {
            Ok(solution) => qdot.copy_from(&solution),
            Err(_) => {
                qdot.fill(0.);
                return IkStatus::Degenerate;
            }
        }
        if degenerate {
            IkStatus::Degenerate
        } else {
            IkStatus::Ok
        }
    }

    fn forward_velocity(&mut self, q: &JntArray, qdot: &JntArray) -> FrameVel {
        assert_eq!(qdot.len(), self.chain.num_joints());
        let pose = self.update_jacobian(q);
        self.twist.gemv(1., &self.jacobian, qdot, 0.);
        FrameVel {
            pose,
            twist: Twist::new(
                Vector3::new(self.twist[0], self.twist[1], self.twist[2]),
                Vector3::new(self.twist[3], self.twist[4], self.twist[5]),
            ),
        }
    }

    fn forward_position(&mut self, q: &JntArray) -> Isometry3<f64> {
        assert_eq!(q.len(), self.chain.num_joints());
        if self.cache_valid && self.cached_q == *q {
            return self.cached_tip;
        }
        let mut transform = Isometry3::identity();
        for (joint, &position) in self.chain.joints().iter().zip(q.iter()) {
            transform *= joint.origin * joint_motion(joint, position);
        }
        transform * self.chain.tip_offset()
    }
}
