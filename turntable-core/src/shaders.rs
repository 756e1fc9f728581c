/// GLSL ES 1.00 shader pair: textured or flat-colored Lambertian surface
use crate::backend::ShaderSources;

pub const VERTEX_SHADER: &str = r#"precision mediump float;

attribute vec3 vertPosition;
attribute vec3 vertNormal;
attribute vec2 vertTexCoord;

uniform mat4 mWorld;
uniform mat4 mView;
uniform mat4 mProj;

varying vec3 fragNormal;
varying vec2 fragTexCoord;

void main()
{
    fragTexCoord = vertTexCoord;
    fragNormal = (mWorld * vec4(vertNormal, 0.0)).xyz;
    gl_Position = mProj * mView * mWorld * vec4(vertPosition, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"precision mediump float;

struct DirectionalLight
{
    vec3 direction;
    vec3 color;
};

varying vec3 fragNormal;
varying vec2 fragTexCoord;

uniform vec3 ambientLightIntensity;
uniform DirectionalLight sun;
uniform vec4 surfaceColor;
uniform bool useTexture;
uniform sampler2D sampler;

void main()
{
    vec3 surfaceNormal = normalize(fragNormal);
    vec3 lightIntensity = ambientLightIntensity +
        sun.color * max(dot(surfaceNormal, normalize(sun.direction)), 0.0);

    vec4 texel = useTexture ? texture2D(sampler, fragTexCoord) : surfaceColor;
    gl_FragColor = vec4(texel.rgb * lightIntensity, texel.a);
}
"#;

pub const ATTR_POSITION: &str = "vertPosition";
pub const ATTR_NORMAL: &str = "vertNormal";
pub const ATTR_TEX_COORD: &str = "vertTexCoord";

pub const UNIFORM_AMBIENT: &str = "ambientLightIntensity";
pub const UNIFORM_SUN_DIRECTION: &str = "sun.direction";
pub const UNIFORM_SUN_COLOR: &str = "sun.color";
pub const UNIFORM_COLOR: &str = "surfaceColor";
pub const UNIFORM_USE_TEXTURE: &str = "useTexture";
pub const UNIFORM_SAMPLER: &str = "sampler";

/// The bundled lit shader pair
pub fn lambert() -> ShaderSources<'static> {
    ShaderSources {
        vertex: VERTEX_SHADER,
        fragment: FRAGMENT_SHADER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MatrixUniform;

    #[test]
    fn test_sources_declare_every_binding() {
        let sources = lambert();
        for name in [ATTR_POSITION, ATTR_NORMAL, ATTR_TEX_COORD] {
            assert!(sources.vertex.contains(name), "{}", name);
        }
        for uniform in [MatrixUniform::World, MatrixUniform::View, MatrixUniform::Projection] {
            assert!(sources.vertex.contains(uniform.name()));
        }
        for name in [UNIFORM_AMBIENT, UNIFORM_COLOR, UNIFORM_USE_TEXTURE, UNIFORM_SAMPLER] {
            assert!(sources.fragment.contains(name), "{}", name);
        }
    }
}
