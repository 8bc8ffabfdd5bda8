mod requests;
mod responses;

pub use requests::{
    EmailRequest, LoginForm, RegisterRequest, ResetPasswordRequest, UpdateUserRequest,
    VerifyRequest,
};
pub use responses::{DeleteResponse, FeedResponse, TokenResponse, UserResponse};
